//! Management of font files and configuration

use crate::error::{Error, Result};
use crate::logs::{LogEvent, Logger};

use fontconfig::{Fontconfig, Pattern};
use fontconfig_sys::fontconfig as sys;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::ffi::{CStr, CString};
use std::fmt;
use std::path::{Path, PathBuf};

const FC_FAMILY: &[u8] = b"family\0";
const FC_STYLE: &[u8] = b"style\0";

fn fc_key(key: &'static [u8]) -> Result<&'static CStr> {
    CStr::from_bytes_with_nul(key)
        .map_err(|_| Error::InvalidCString(String::from_utf8_lossy(key).into_owned()))
}

/// Where a font comes from: a font file, or a family name (and optional style)
/// looked up through fontconfig.
#[derive(Debug, Clone, PartialEq)]
pub enum FontSpec {
    Path(PathBuf),
    Desc { name: String, style: Option<String> },
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::Desc {
            name: String::from("Arial"),
            style: None,
        }
    }
}

/// The font text layers are drawn with. Falls back to a default family when the
/// preferred one cannot be resolved.
#[derive(Debug, Clone)]
pub struct FontMap {
    family: String,
    style: Option<String>,
    fallback: bool,
}

impl Default for FontMap {
    fn default() -> Self {
        Self {
            family: String::from(Self::DEFAULT_FAMILY),
            style: None,
            fallback: true,
        }
    }
}

impl FontMap {
    pub const DEFAULT_FAMILY: &'static str = "Sans";

    /// Resolves `spec`. Failing to resolve it is not an error: the default
    /// family is used instead and a warning is logged.
    pub fn load(spec: &FontSpec, logger: &mut dyn Logger) -> Self {
        let resolved = Fontconfig::new()
            .ok_or(Error::FontconfigUnavailable)
            .and_then(|fc| match spec {
                FontSpec::Path(path) => Self::family_from_file(&fc, path).map(|f| (f, None)),
                FontSpec::Desc { name, style } => {
                    Self::family_from_name(&fc, name, style.as_deref())
                        .map(|f| (f, style.clone()))
                }
            });
        match resolved {
            Ok((family, style)) => {
                logger.log(LogEvent::Info(format!("using font family `{family}`")));
                Self {
                    family,
                    style,
                    fallback: false,
                }
            }
            Err(e) => {
                logger.log(LogEvent::Warn(format!(
                    "{e}, falling back to `{}`",
                    Self::DEFAULT_FAMILY
                )));
                Self::default()
            }
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Font description for a font `size` pixels tall.
    pub fn description(&self, size: f64) -> pango::FontDescription {
        let desc = match &self.style {
            Some(style) => format!("{}, {style}", self.family),
            None => self.family.clone(),
        };
        let mut desc = pango::FontDescription::from_string(&desc);
        desc.set_absolute_size(size.max(1.0) * pango::SCALE as f64);
        desc
    }

    fn family_from_name(fc: &Fontconfig, family: &str, style: Option<&str>) -> Result<String> {
        let mut pat = Pattern::new(fc);
        let c_family =
            CString::new(family).map_err(|_| Error::InvalidCString(family.to_string()))?;
        pat.add_string(fc_key(FC_FAMILY)?, &c_family);

        if let Some(style) = style {
            let c_style =
                CString::new(style).map_err(|_| Error::InvalidCString(style.to_string()))?;
            pat.add_string(fc_key(FC_STYLE)?, &c_style);
        }

        // fontconfig always answers with its closest match, which may be another family
        let matched = pat.font_match();
        match matched.get_string(fc_key(FC_FAMILY)?) {
            Some(found) if found.eq_ignore_ascii_case(family) => Ok(found.to_string()),
            _ => Err(Error::LoadFontError(family.into())),
        }
    }

    fn family_from_file(fc: &Fontconfig, fp: &Path) -> Result<String> {
        let name = fp.to_string_lossy().to_string();
        let c_fp = CString::new(name.clone()).map_err(|_| Error::InvalidCString(name.clone()))?;
        let family = Self::scan_family(fc, &c_fp)?.ok_or_else(|| Error::LoadFontError(name.clone()))?;

        let status = unsafe {
            sys::FcConfigAppFontAddFile(std::ptr::null_mut(), c_fp.as_ptr() as *const sys::FcChar8)
        };
        if status == 0 {
            Err(Error::LoadFontError(name))
        } else {
            Ok(family)
        }
    }

    fn scan_family(fc: &Fontconfig, c_fp: &CString) -> Result<Option<String>> {
        let key = fc_key(FC_FAMILY)?;
        let family = unsafe {
            let set = sys::FcFontSetCreate();
            let status = sys::FcFileScan(
                set,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                c_fp.as_ptr() as *const sys::FcChar8,
                1,
            );
            let family = if status == 0 || (*set).nfont < 1 {
                None
            } else {
                let pat = Pattern::from_pattern(fc, *(*set).fonts);
                pat.get_string(key).map(str::to_string)
            };
            sys::FcFontSetDestroy(set);
            family
        };
        Ok(family)
    }
}

struct FontSpecVisitor;

impl<'de> Visitor<'de> for FontSpecVisitor {
    type Value = FontSpec;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with either `path` or `name` set")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: de::MapAccess<'de>,
    {
        let mut name: Option<String> = None;
        let mut style: Option<String> = None;
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "path" => {
                    let path = map.next_value::<PathBuf>()?;
                    return Ok(FontSpec::Path(path));
                }
                "name" => {
                    name = Some(map.next_value::<String>()?);
                }
                "style" => {
                    style = Some(map.next_value::<String>()?);
                }
                _ => {
                    return Err(de::Error::unknown_field(
                        key.as_str(),
                        &["path", "name", "style"],
                    ))
                }
            }
        }
        if let Some(name) = name {
            Ok(FontSpec::Desc { name, style })
        } else {
            Err(de::Error::missing_field("name"))
        }
    }
}

impl<'de> Deserialize<'de> for FontSpec {
    fn deserialize<D>(deserializer: D) -> std::result::Result<FontSpec, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FontSpecVisitor)
    }
}
