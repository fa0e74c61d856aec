//! Built-in function listing for the `functions` command

use crate::ast::Builtin;

const GROUPS: [(&str, &[Builtin]); 3] = [
    (
        "MATH",
        &[
            Builtin::Sin,
            Builtin::Cos,
            Builtin::Asin,
            Builtin::Acos,
            Builtin::Tan,
            Builtin::Atan,
            Builtin::Exp,
            Builtin::Ln,
            Builtin::Log,
            Builtin::Neg,
            Builtin::Abs,
            Builtin::Sqrt,
            Builtin::Round,
            Builtin::Floor,
            Builtin::Ceil,
            Builtin::Min,
            Builtin::Max,
        ],
    ),
    (
        "VALUES",
        &[
            Builtin::Size,
            Builtin::IsString,
            Builtin::IsNumeric,
            Builtin::IsArray,
            Builtin::IsNull,
            Builtin::ToArray,
            Builtin::ToString,
            Builtin::ToNumber,
            Builtin::Debug,
        ],
    ),
    (
        "DATES",
        &[
            Builtin::Day,
            Builtin::Month,
            Builtin::Year,
            Builtin::DayOfYear,
            Builtin::DaysInMonth,
            Builtin::Now,
            Builtin::Iso,
            Builtin::DaysBeforeNow,
            Builtin::HoursBeforeNow,
        ],
    ),
];

/// Text listing every built-in with its one-line summary.
pub fn functions_overview() -> String {
    let mut out = String::from("BUILT-IN FUNCTIONS\n");
    for (title, functions) in GROUPS {
        out.push('\n');
        out.push_str(title);
        out.push('\n');
        for function in functions.iter() {
            out.push_str(&format!("  {}\n", function.summary()));
        }
    }
    out.push_str(
        "\nDates are UTC. Date arguments are ISO-8601 strings or epoch milliseconds;\n\
         omitted arguments mean \"now\".\n",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_listed_once() {
        let listed: Vec<Builtin> = GROUPS.iter().flat_map(|(_, f)| f.iter().copied()).collect();
        assert_eq!(listed.len(), Builtin::ALL.len());
        for builtin in Builtin::ALL {
            assert!(listed.contains(&builtin), "{} missing", builtin.name());
        }
        assert!(functions_overview().contains("days_in_month"));
    }
}
