use crate::tree::{Scalar, SettingType};

pub const OVERFLOW: &str = "overflow";
pub const NEGATIVE: &str = "negative value";
pub const UNSUPPORTED: &str = "unsupported conversion";
pub const NOT_FINITE: &str = "float out of range";

/// Convert a scalar into another scalar type.
///
/// This is the only conversion table in the crate: typed extraction and
/// assignment both go through it.
///
/// | target | accepted sources |
/// |--------|------------------|
/// | Bool   | Bool, Int, Int64 (nonzero test) |
/// | Int    | Bool, Int, Int64 (range checked) |
/// | Int64  | Bool, Int, Int64 |
/// | Float  | Int, Int64, Float (finite only) |
/// | String | String |
pub fn convert(value: &Scalar, target: SettingType) -> Result<Scalar, &'static str> {
    match (value, target) {
        (Scalar::Bool(b), SettingType::Bool) => Ok(Scalar::Bool(*b)),
        (Scalar::Int(i), SettingType::Bool) => Ok(Scalar::Bool(*i != 0)),
        (Scalar::Int64(i), SettingType::Bool) => Ok(Scalar::Bool(*i != 0)),

        (Scalar::Bool(b), SettingType::Int) => Ok(Scalar::Int(i32::from(*b))),
        (Scalar::Int(i), SettingType::Int) => Ok(Scalar::Int(*i)),
        (Scalar::Int64(i), SettingType::Int) => {
            i32::try_from(*i).map(Scalar::Int).map_err(|_| OVERFLOW)
        }

        (Scalar::Bool(b), SettingType::Int64) => Ok(Scalar::Int64(i64::from(*b))),
        (Scalar::Int(i), SettingType::Int64) => Ok(Scalar::Int64(i64::from(*i))),
        (Scalar::Int64(i), SettingType::Int64) => Ok(Scalar::Int64(*i)),

        (Scalar::Int(i), SettingType::Float) => Ok(Scalar::Float(*i as f32)),
        (Scalar::Int64(i), SettingType::Float) => Ok(Scalar::Float(*i as f32)),
        (Scalar::Float(f), SettingType::Float) if !f.is_finite() => Err(NOT_FINITE),
        (Scalar::Float(f), SettingType::Float) => Ok(Scalar::Float(*f)),

        (Scalar::String(s), SettingType::String) => Ok(Scalar::String(s.clone())),

        _ => Err(UNSUPPORTED),
    }
}

/// Rust types a scalar setting can be read as.
pub trait FromScalar: Sized {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str>;
}

impl FromScalar for bool {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        match convert(value, SettingType::Bool)? {
            Scalar::Bool(b) => Ok(b),
            _ => Err(UNSUPPORTED),
        }
    }
}

impl FromScalar for i32 {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        match convert(value, SettingType::Int)? {
            Scalar::Int(i) => Ok(i),
            _ => Err(UNSUPPORTED),
        }
    }
}

impl FromScalar for i64 {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        match convert(value, SettingType::Int64)? {
            Scalar::Int64(i) => Ok(i),
            _ => Err(UNSUPPORTED),
        }
    }
}

impl FromScalar for u32 {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        let wide = i64::from_scalar(value)?;
        if wide < 0 {
            return Err(NEGATIVE);
        }
        u32::try_from(wide).map_err(|_| OVERFLOW)
    }
}

impl FromScalar for u64 {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        let wide = i64::from_scalar(value)?;
        u64::try_from(wide).map_err(|_| NEGATIVE)
    }
}

impl FromScalar for f32 {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        match convert(value, SettingType::Float)? {
            Scalar::Float(f) => Ok(f),
            _ => Err(UNSUPPORTED),
        }
    }
}

impl FromScalar for f64 {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        f32::from_scalar(value).map(f64::from)
    }
}

impl FromScalar for String {
    fn from_scalar(value: &Scalar) -> Result<Self, &'static str> {
        match convert(value, SettingType::String)? {
            Scalar::String(s) => Ok(s),
            _ => Err(UNSUPPORTED),
        }
    }
}
