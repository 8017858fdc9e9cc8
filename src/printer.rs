//! Serialization back to the configuration text format.

use std::fmt::{self, Write};

use crate::config::Config;
use crate::setting::Setting;
use crate::tree::{Format, Scalar, SettingType};

const INDENT: &str = "    ";

fn indent(f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str(INDENT)?;
    }
    Ok(())
}

fn write_setting(f: &mut fmt::Formatter<'_>, setting: Setting<'_>, level: usize) -> fmt::Result {
    if !setting.name().is_empty() {
        write!(f, "{} = ", setting.name())?;
    }
    write_value(f, setting, level)
}

fn write_value(f: &mut fmt::Formatter<'_>, setting: Setting<'_>, level: usize) -> fmt::Result {
    match setting.setting_type() {
        SettingType::Array => {
            f.write_char('[')?;
            for (i, child) in setting.children().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(f, child, 0)?;
            }
            f.write_char(']')
        }
        SettingType::List => {
            if setting.is_empty() {
                return f.write_str("()");
            }
            f.write_str("(\n")?;
            for (i, child) in setting.children().enumerate() {
                if i > 0 {
                    f.write_str(",\n")?;
                }
                indent(f, level + 1)?;
                write_setting(f, child, level + 1)?;
            }
            f.write_char('\n')?;
            indent(f, level)?;
            f.write_char(')')
        }
        SettingType::Group => write_group(f, setting, level),
        _ => match setting.scalar() {
            Some(value) => write_scalar(f, value, setting.format()),
            None => Ok(()),
        },
    }
}

/// The anonymous root prints its settings bare; every other group is braced.
fn write_group(f: &mut fmt::Formatter<'_>, setting: Setting<'_>, level: usize) -> fmt::Result {
    let braced = !setting.is_root() || !setting.name().is_empty();
    if setting.is_empty() {
        return if braced { f.write_str("{}") } else { Ok(()) };
    }
    let child_level = if braced { level + 1 } else { level };
    if braced {
        f.write_str("{\n")?;
    }
    for child in setting.children() {
        indent(f, child_level)?;
        write_setting(f, child, child_level)?;
        f.write_str(";\n")?;
    }
    if braced {
        indent(f, level)?;
        f.write_char('}')?;
    }
    Ok(())
}

fn write_scalar(f: &mut fmt::Formatter<'_>, value: &Scalar, format: Format) -> fmt::Result {
    match (value, format) {
        (Scalar::Bool(b), _) => write!(f, "{}", b),
        (Scalar::Int(i), Format::Hex) => write!(f, "0x{:x}", *i as u32),
        (Scalar::Int(i), Format::Default) => write!(f, "{}", i),
        (Scalar::Int64(i), Format::Hex) => write!(f, "0x{:x}L", *i as u64),
        (Scalar::Int64(i), Format::Default) => write!(f, "{}L", i),
        (Scalar::Float(v), _) => f.write_str(&format_float(*v)),
        (Scalar::String(s), _) => write_quoted(f, s),
    }
}

/// Debug formatting keeps a `.` or an exponent, so the text reads back as a float.
pub(crate) fn format_float(v: f32) -> String {
    format!("{:?}", v)
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

impl fmt::Display for Setting<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_setting(f, *self, 0)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_setting(f, self.root(), 0)
    }
}
