use serde::Serialize;
use std::fmt;

/// Health band for a final score.
///
/// | Range | Grade | Label     |
/// |-------|-------|-----------|
/// | >= 85 | A     | excellent |
/// | >= 70 | B     | good      |
/// | >= 55 | C     | normal    |
/// | < 55  | D     | bad       |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn label(self) -> &'static str {
        match self {
            Grade::A => "excellent",
            Grade::B => "good",
            Grade::C => "normal",
            Grade::D => "bad",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        };
        f.write_str(s)
    }
}

pub fn grade(score: f64) -> Grade {
    match score {
        s if s >= 85.0 => Grade::A,
        s if s >= 70.0 => Grade::B,
        s if s >= 55.0 => Grade::C,
        _ => Grade::D,
    }
}
