// pt-BR number and currency formatting for rendered values

/// Compact Brazilian real: `R$ 1.2M`, `R$ 45.0K`, `R$ 999,50`.
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        return "R$ 0".to_string();
    }
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        return format!("R$ {:.1}M", value / 1_000_000.0);
    }
    if abs >= 1_000.0 {
        return format!("R$ {:.1}K", value / 1_000.0);
    }

    let cents = (abs * 100.0).round() as i64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, group_thousands((cents / 100) as u64), cents % 100)
}

/// Integer with `.` thousands separators.
pub fn format_num(value: i64) -> String {
    let grouped = group_thousands(value.unsigned_abs());
    if value < 0 { format!("-{}", grouped) } else { grouped }
}

pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{}%", value)
    } else {
        "0%".to_string()
    }
}

pub fn format_days(days: i64) -> String {
    format!("{}d", days)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}
