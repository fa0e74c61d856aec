use std::fmt;

/// Number of arguments a built-in accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// Functions built into the language.
///
/// A reserved name only denotes a built-in when it is followed by `(`;
/// otherwise it is an ordinary variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    // Math
    Sin,
    Cos,
    Asin,
    Acos,
    Tan,
    Atan,
    Exp,
    Ln,
    Log,
    Neg,
    Abs,
    Sqrt,
    Round,
    Floor,
    Ceil,
    Min,
    Max,

    // Introspection and conversion
    Size,
    IsString,
    IsNumeric,
    IsArray,
    IsNull,
    ToArray,
    ToString,
    ToNumber,

    // Date and time
    Day,
    Month,
    Year,
    DayOfYear,
    DaysInMonth,
    Now,
    Iso,
    DaysBeforeNow,
    HoursBeforeNow,

    /// Logs its argument
    Debug,
}

impl Builtin {
    pub const ALL: [Builtin; 35] = [
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
        Builtin::Size,
        Builtin::IsString,
        Builtin::IsNumeric,
        Builtin::IsArray,
        Builtin::IsNull,
        Builtin::ToArray,
        Builtin::ToString,
        Builtin::ToNumber,
        Builtin::Day,
        Builtin::Month,
        Builtin::Year,
        Builtin::DayOfYear,
        Builtin::DaysInMonth,
        Builtin::Now,
        Builtin::Iso,
        Builtin::DaysBeforeNow,
        Builtin::HoursBeforeNow,
        Builtin::Debug,
    ];

    pub fn from_name(name: &str) -> Option<Builtin> {
        Builtin::ALL.iter().copied().find(|b| b.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Sin => "sin",
            Builtin::Cos => "cos",
            Builtin::Asin => "asin",
            Builtin::Acos => "acos",
            Builtin::Tan => "tan",
            Builtin::Atan => "atan",
            Builtin::Exp => "exp",
            Builtin::Ln => "ln",
            Builtin::Log => "log",
            Builtin::Neg => "neg",
            Builtin::Abs => "abs",
            Builtin::Sqrt => "sqrt",
            Builtin::Round => "round",
            Builtin::Floor => "floor",
            Builtin::Ceil => "ceil",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Size => "size",
            Builtin::IsString => "is_string",
            Builtin::IsNumeric => "is_numeric",
            Builtin::IsArray => "is_array",
            Builtin::IsNull => "is_null",
            Builtin::ToArray => "to_array",
            Builtin::ToString => "to_string",
            Builtin::ToNumber => "to_number",
            Builtin::Day => "day",
            Builtin::Month => "month",
            Builtin::Year => "year",
            Builtin::DayOfYear => "day_of_year",
            Builtin::DaysInMonth => "days_in_month",
            Builtin::Now => "now",
            Builtin::Iso => "iso",
            Builtin::DaysBeforeNow => "days_before_now",
            Builtin::HoursBeforeNow => "hours_before_now",
            Builtin::Debug => "debug",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Builtin::Round => Arity::Range(1, 2),
            Builtin::Min | Builtin::Max => Arity::AtLeast(1),
            Builtin::ToArray => Arity::AtLeast(0),
            Builtin::Day
            | Builtin::Month
            | Builtin::Year
            | Builtin::DayOfYear
            | Builtin::DaysInMonth => Arity::Range(0, 1),
            Builtin::Now => Arity::Exact(0),
            _ => Arity::Exact(1),
        }
    }

    /// One-line usage, shown by `tally functions`.
    pub fn summary(&self) -> &'static str {
        match self {
            Builtin::Sin => "sin(x): sine of x radians",
            Builtin::Cos => "cos(x): cosine of x radians",
            Builtin::Asin => "asin(x): arc sine, in radians",
            Builtin::Acos => "acos(x): arc cosine, in radians",
            Builtin::Tan => "tan(x): tangent of x radians",
            Builtin::Atan => "atan(x): arc tangent, in radians",
            Builtin::Exp => "exp(x): e raised to x",
            Builtin::Ln => "ln(x): natural logarithm",
            Builtin::Log => "log(x): base-10 logarithm",
            Builtin::Neg => "neg(x): -x",
            Builtin::Abs => "abs(x): absolute value",
            Builtin::Sqrt => "sqrt(x): square root",
            Builtin::Round => "round(x[, digits]): round with the configured rounding mode",
            Builtin::Floor => "floor(x): largest integer <= x",
            Builtin::Ceil => "ceil(x): smallest integer >= x",
            Builtin::Min => "min(a, ...): smallest argument (or array element)",
            Builtin::Max => "max(a, ...): largest argument (or array element)",
            Builtin::Size => "size(x): element count of an array, character count of a string",
            Builtin::IsString => "is_string(x): true for strings",
            Builtin::IsNumeric => "is_numeric(x): true for numbers",
            Builtin::IsArray => "is_array(x): true for arrays",
            Builtin::IsNull => "is_null(x): true for null",
            Builtin::ToArray => "to_array(a, ...): array of the arguments",
            Builtin::ToString => "to_string(x): text form of x",
            Builtin::ToNumber => "to_number(x): number parsed from x, or null",
            Builtin::Day => "day([date]): day of month (1-31)",
            Builtin::Month => "month([date]): month (1-12)",
            Builtin::Year => "year([date]): calendar year",
            Builtin::DayOfYear => "day_of_year([date]): day of year (1-366)",
            Builtin::DaysInMonth => {
                "days_in_month([offset | date]): days in the current month shifted by offset months, or in date's month"
            }
            Builtin::Now => "now(): current time in epoch milliseconds",
            Builtin::Iso => "iso(text): ISO-8601 date/time to epoch milliseconds",
            Builtin::DaysBeforeNow => "days_before_now(date): whole days between date and now",
            Builtin::HoursBeforeNow => "hours_before_now(date): whole hours between date and now",
            Builtin::Debug => "debug(x): log x, returns null",
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
        }
        assert_eq!(Builtin::from_name("extf"), None);
    }

    #[test]
    fn arity_accepts() {
        assert!(Arity::Range(0, 1).accepts(0));
        assert!(!Arity::Exact(1).accepts(2));
        assert!(Arity::AtLeast(1).accepts(5));
    }
}
