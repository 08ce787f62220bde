//! Named checks against live page state
//!
//! An [`Assertion`] is immutable once built: a name plus an evaluation
//! closure over the session. The constructors below cover the checks a
//! static-page verification needs (text, computed style, element counts,
//! box geometry, library-loaded flags, triggered downloads, screenshots).

use crate::{Error, Result, Session};
use std::path::PathBuf;
use std::time::Duration;

type Check = Box<dyn Fn(&mut dyn Session) -> Result<()>>;

/// A single named pass/fail check
pub struct Assertion {
    name: String,
    check: Check,
}

/// Embed a selector into generated JS as a safely quoted string literal.
fn quoted(selector: &str) -> String {
    serde_json::Value::String(selector.to_string()).to_string()
}

/// Evaluate `expr` in the page and bring the result back through
/// `JSON.stringify`, so arrays and objects survive the protocol boundary
/// (plain evaluation only carries primitives by value).
fn eval_json(session: &mut dyn Session, expr: &str) -> Result<serde_json::Value> {
    let value = session.evaluate(&format!("JSON.stringify({expr})"))?;
    match value {
        serde_json::Value::String(s) => match serde_json::from_str(&s) {
            Ok(parsed) => Ok(parsed),
            // A backend that already unwraps values hands us the bare string.
            Err(_) => Ok(serde_json::Value::String(s)),
        },
        other => Ok(other),
    }
}

impl Assertion {
    fn new(name: &str, check: Check) -> Self {
        Self {
            name: name.to_string(),
            check,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the check against the session.
    pub fn check(&self, session: &mut dyn Session) -> Result<()> {
        (self.check)(session)
    }

    /// The first element matching `selector` has trimmed text content equal
    /// to `expected`.
    pub fn text_equals(name: &str, selector: &str, expected: &str) -> Self {
        let q = quoted(selector);
        let expected = expected.to_string();
        let label = name.to_string();
        Self::new(
            name,
            Box::new(move |session| {
                let script = format!(
                    "(function(){{ var el = document.querySelector({q}); return el ? el.textContent.trim() : null; }})()"
                );
                let value = eval_json(session, &script)?;
                let actual = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        return Err(Error::Assertion {
                            name: label.clone(),
                            expected: format!("text '{}'", expected),
                            actual: "no matching element".to_string(),
                        })
                    }
                };
                if actual == expected {
                    Ok(())
                } else {
                    Err(Error::Assertion {
                        name: label.clone(),
                        expected: format!("text '{}'", expected),
                        actual: format!("'{}'", actual),
                    })
                }
            }),
        )
    }

    /// A computed-style property of the first matching element equals
    /// `expected` (e.g. `text-transform` is `none`).
    pub fn computed_style(name: &str, selector: &str, property: &str, expected: &str) -> Self {
        let q = quoted(selector);
        let prop = quoted(property);
        let expected = expected.to_string();
        let label = name.to_string();
        Self::new(
            name,
            Box::new(move |session| {
                let script = format!(
                    "(function(){{ var el = document.querySelector({q}); return el ? getComputedStyle(el).getPropertyValue({prop}) : null; }})()"
                );
                let value = eval_json(session, &script)?;
                let actual = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => {
                        return Err(Error::Assertion {
                            name: label.clone(),
                            expected: expected.clone(),
                            actual: "no matching element".to_string(),
                        })
                    }
                };
                if actual == expected {
                    Ok(())
                } else {
                    Err(Error::Assertion {
                        name: label.clone(),
                        expected: expected.clone(),
                        actual,
                    })
                }
            }),
        )
    }

    /// Exactly `expected` elements match `selector`.
    pub fn element_count(name: &str, selector: &str, expected: usize) -> Self {
        let q = quoted(selector);
        let label = name.to_string();
        Self::new(
            name,
            Box::new(move |session| {
                let script = format!("document.querySelectorAll({q}).length");
                let value = eval_json(session, &script)?;
                let actual = value.as_u64().unwrap_or(0) as usize;
                if actual == expected {
                    Ok(())
                } else {
                    Err(Error::Assertion {
                        name: label.clone(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    })
                }
            }),
        )
    }

    /// Every element matching `selector` has a near-square bounding box:
    /// |width - height| < `tolerance_px`. Fails when nothing matches.
    pub fn square_boxes(name: &str, selector: &str, tolerance_px: f64) -> Self {
        let q = quoted(selector);
        let label = name.to_string();
        Self::new(
            name,
            Box::new(move |session| {
                let script = format!(
                    "Array.from(document.querySelectorAll({q})).map(function(el){{ var r = el.getBoundingClientRect(); return [r.width, r.height]; }})"
                );
                let value = eval_json(session, &script)?;
                let boxes = value.as_array().cloned().unwrap_or_default();
                if boxes.is_empty() {
                    return Err(Error::Assertion {
                        name: label.clone(),
                        expected: "at least one matching element".to_string(),
                        actual: "none".to_string(),
                    });
                }
                for (i, b) in boxes.iter().enumerate() {
                    let (width, height) = match (
                        b.get(0).and_then(|v| v.as_f64()),
                        b.get(1).and_then(|v| v.as_f64()),
                    ) {
                        (Some(w), Some(h)) => (w, h),
                        _ => {
                            return Err(Error::Assertion {
                                name: label.clone(),
                                expected: "numeric width and height".to_string(),
                                actual: format!("element {} reported {}", i, b),
                            })
                        }
                    };
                    if (width - height).abs() >= tolerance_px {
                        return Err(Error::Assertion {
                            name: label.clone(),
                            expected: format!("|width - height| < {}px", tolerance_px),
                            actual: format!("element {} is {}x{}", i, width, height),
                        });
                    }
                }
                Ok(())
            }),
        )
    }

    /// A global symbol is defined, i.e. a third-party library has finished
    /// loading (`typeof symbol !== 'undefined'`).
    pub fn global_defined(name: &str, symbol: &str) -> Self {
        let symbol = symbol.to_string();
        let label = name.to_string();
        Self::new(
            name,
            Box::new(move |session| {
                let script = format!("typeof {symbol} !== 'undefined'");
                let value = eval_json(session, &script)?;
                if value.as_bool() == Some(true) {
                    Ok(())
                } else {
                    Err(Error::Assertion {
                        name: label.clone(),
                        expected: format!("global '{}' to be defined", symbol),
                        actual: "undefined".to_string(),
                    })
                }
            }),
        )
    }

    /// Clicking `selector` triggers a file-download event within `timeout`.
    ///
    /// The expectation is armed before the click is dispatched, so the event
    /// cannot be lost to a trigger/observe race.
    pub fn download_on_click(name: &str, selector: &str, timeout: Duration) -> Self {
        let selector = selector.to_string();
        Self::new(
            name,
            Box::new(move |session| {
                let expectation = session.expect_download()?;
                session.click(&selector)?;
                let filename = expectation.wait(timeout)?;
                log::info!("download started: {}", filename);
                Ok(())
            }),
        )
    }

    /// Capture a full-page PNG and write it to `path`, creating parent
    /// directories as needed.
    pub fn screenshot_to(name: &str, path: PathBuf) -> Self {
        Self::new(
            name,
            Box::new(move |session| {
                let png = session.screenshot_png()?;
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .map_err(|e| Error::Screenshot(format!("mkdir failed: {}", e)))?;
                    }
                }
                std::fs::write(&path, png)
                    .map_err(|e| Error::Screenshot(format!("write failed: {}", e)))?;
                Ok(())
            }),
        )
    }
}

impl std::fmt::Debug for Assertion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assertion").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_quoting_escapes() {
        assert_eq!(quoted("a[download=\"x\"]"), r#""a[download=\"x\"]""#);
        assert_eq!(quoted(".bingo-cell"), r#"".bingo-cell""#);
    }

    #[test]
    fn test_assertion_keeps_its_name() {
        let a = Assertion::element_count("bingo cell count", ".bingo-cell", 25);
        assert_eq!(a.name(), "bingo cell count");
    }
}
