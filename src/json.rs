//! JSON export of a setting tree, used by the CLI's `--json` output.
//!
//! Groups become objects, lists and arrays become arrays. Integers are
//! written in decimal whatever their format hint.

use std::fmt::Write;

use crate::config::Config;
use crate::printer::format_float;
use crate::setting::Setting;
use crate::tree::{Scalar, SettingType};

struct JsonWriter {
    buf: String,
    /// 2-space indented, one entry per line.
    pretty: bool,
    depth: usize,
}

impl JsonWriter {
    fn new(pretty: bool) -> Self {
        JsonWriter {
            buf: String::new(),
            pretty,
            depth: 0,
        }
    }

    fn break_line(&mut self) {
        if self.pretty {
            self.buf.push('\n');
            self.buf.push_str(&"  ".repeat(self.depth));
        }
    }

    fn write_setting(&mut self, setting: Setting<'_>) {
        match setting.setting_type() {
            SettingType::Group => self.write_container(setting, '{', '}'),
            SettingType::List | SettingType::Array => self.write_container(setting, '[', ']'),
            _ => {
                if let Some(value) = setting.scalar() {
                    self.write_scalar(value);
                }
            }
        }
    }

    /// Objects and arrays share a layout; only group children carry keys.
    fn write_container(&mut self, container: Setting<'_>, open: char, close: char) {
        self.buf.push(open);
        if container.is_empty() {
            self.buf.push(close);
            return;
        }
        self.depth += 1;
        for (i, child) in container.children().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            self.break_line();
            if open == '{' {
                self.write_string(child.name());
                self.buf.push_str(if self.pretty { ": " } else { ":" });
            }
            self.write_setting(child);
        }
        self.depth -= 1;
        self.break_line();
        self.buf.push(close);
    }

    fn write_scalar(&mut self, scalar: &Scalar) {
        match scalar {
            Scalar::Bool(b) => {
                let _ = write!(self.buf, "{}", b);
            }
            Scalar::Int(i) => {
                let _ = write!(self.buf, "{}", i);
            }
            Scalar::Int64(i) => {
                let _ = write!(self.buf, "{}", i);
            }
            Scalar::Float(f) => self.buf.push_str(&format_float(*f)),
            Scalar::String(s) => self.write_string(s),
        }
    }

    fn write_string(&mut self, s: &str) {
        self.buf.push('"');
        for ch in s.chars() {
            match ch {
                '"' | '\\' => {
                    self.buf.push('\\');
                    self.buf.push(ch);
                }
                '\n' => self.buf.push_str("\\n"),
                '\t' => self.buf.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(self.buf, "\\u{:04x}", c as u32);
                }
                c => self.buf.push(c),
            }
        }
        self.buf.push('"');
    }
}

/// Serialize a setting to a compact JSON string (no whitespace).
pub fn to_json(setting: Setting<'_>) -> String {
    let mut w = JsonWriter::new(false);
    w.write_setting(setting);
    w.buf
}

/// Serialize a setting to a pretty-printed JSON string (2-space indent).
pub fn to_json_pretty(setting: Setting<'_>) -> String {
    let mut w = JsonWriter::new(true);
    w.write_setting(setting);
    w.buf
}

impl Config {
    pub fn to_json(&self) -> String {
        to_json(self.root())
    }

    pub fn to_json_pretty(&self) -> String {
        to_json_pretty(self.root())
    }
}
