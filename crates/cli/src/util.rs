use chrono::{Datelike, NaiveDate};

/// Format an FCFA amount with thousands grouping ("1 234 567 FCFA").
/// XOF has no minor units, so there is never a decimal part.
pub(crate) fn format_fcfa(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}{} FCFA", sign, grouped)
}

/// School year containing `today`. The year runs from September:
/// 2026-03-01 is in "2025-2026", 2026-10-01 is in "2026-2027".
pub(crate) fn default_school_year(today: NaiveDate) -> String {
    let year = today.year();
    if today.month() >= 9 {
        format!("{}-{}", year, year + 1)
    } else {
        format!("{}-{}", year - 1, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fcfa_grouping() {
        assert_eq!(format_fcfa(0), "0 FCFA");
        assert_eq!(format_fcfa(950), "950 FCFA");
        assert_eq!(format_fcfa(75_000), "75 000 FCFA");
        assert_eq!(format_fcfa(1_234_567), "1 234 567 FCFA");
        assert_eq!(format_fcfa(-200_000), "-200 000 FCFA");
    }

    #[test]
    fn school_year_runs_from_september() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(default_school_year(d(2026, 3, 1)), "2025-2026");
        assert_eq!(default_school_year(d(2026, 8, 31)), "2025-2026");
        assert_eq!(default_school_year(d(2026, 9, 1)), "2026-2027");
        assert_eq!(default_school_year(d(2026, 12, 31)), "2026-2027");
    }
}
