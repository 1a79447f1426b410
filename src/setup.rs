use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportSetup {
    pub file_prefix: String,
    pub unassigned_label: String,
}

impl Default for ExportSetup {
    fn default() -> Self {
        Self {
            file_prefix: "absensi_nilai".to_string(),
            unassigned_label: "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintSetup {
    pub title: String,
    pub school_name: String,
    pub show_generated_at: bool,
}

impl Default for PrintSetup {
    fn default() -> Self {
        Self {
            title: "Rekap Absensi & Nilai".to_string(),
            school_name: String::new(),
            show_generated_at: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupConfig {
    pub export: ExportSetup,
    pub print: PrintSetup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupSection {
    Export,
    Print,
}

impl SetupSection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "export" => Some(Self::Export),
            "print" => Some(Self::Print),
            _ => None,
        }
    }
}

fn parse_bool(v: &Value, key: &str) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| format!("{} must be boolean", key))
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.chars().count() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_file_prefix(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 40)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    if !s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(format!("{} may only contain letters, digits, '_' and '-'", key));
    }
    Ok(s)
}

impl SetupConfig {
    /// Applies a partial update to one section. Every field is validated
    /// before anything is written, so a rejected patch leaves `self` as it was.
    pub fn apply_patch(
        &mut self,
        section: SetupSection,
        patch: &Map<String, Value>,
    ) -> Result<(), String> {
        let mut next = self.clone();
        for (k, v) in patch {
            match section {
                SetupSection::Export => match k.as_str() {
                    "filePrefix" => next.export.file_prefix = parse_file_prefix(v, k)?,
                    "unassignedLabel" => {
                        next.export.unassigned_label = parse_string_max(v, k, 16)?
                    }
                    _ => return Err(format!("unknown export field: {}", k)),
                },
                SetupSection::Print => match k.as_str() {
                    "title" => next.print.title = parse_string_max(v, k, 120)?,
                    "schoolName" => next.print.school_name = parse_string_max(v, k, 120)?,
                    "showGeneratedAt" => next.print.show_generated_at = parse_bool(v, k)?,
                    _ => return Err(format!("unknown print field: {}", k)),
                },
            }
        }
        *self = next;
        Ok(())
    }
}
