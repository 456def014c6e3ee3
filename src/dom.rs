//! Read-only access to a located card element.
//!
//! The card extractor only ever needs a handful of queries against a card:
//! find a nested element, read an attribute, read the rendered text. The
//! `CardNode` trait captures exactly that so the same extraction code runs
//! against a live Chrome tab or a saved HTML snapshot.

use headless_chrome::browser::tab::NoElementFound;
use scraper::{ElementRef, Selector};

use crate::error::CardError;

/// A sub-field that may or may not exist on a given card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Present(String),
    Absent,
}

impl Field {
    /// Trimmed text, or empty when absent.
    pub fn or_empty(self) -> String {
        self.or_sentinel("")
    }

    /// Trimmed text, or `sentinel` when absent. A present-but-blank value
    /// stays blank.
    pub fn or_sentinel(self, sentinel: &str) -> String {
        match self {
            Field::Present(text) => text.trim().to_string(),
            Field::Absent => sentinel.to_string(),
        }
    }
}

impl From<Option<String>> for Field {
    fn from(value: Option<String>) -> Self {
        value.map_or(Field::Absent, Field::Present)
    }
}

pub trait CardNode: Sized {
    /// First descendant matching `selector`, `None` when there is none.
    fn find(&self, selector: &str) -> Result<Option<Self>, CardError>;

    /// All descendants matching `selector`, in document order.
    fn find_all(&self, selector: &str) -> Result<Vec<Self>, CardError>;

    fn attr(&self, name: &str) -> Result<Option<String>, CardError>;

    fn inner_text(&self) -> Result<String, CardError>;

    /// First descendant matching `selector` whose text contains `needle`
    /// (case-insensitive).
    fn find_with_text(&self, selector: &str, needle: &str) -> Result<Option<Self>, CardError> {
        let needle = needle.to_lowercase();
        for node in self.find_all(selector)? {
            if node.inner_text()?.to_lowercase().contains(&needle) {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}

// ============================================================================
// Live browser
// ============================================================================

fn is_missing(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NoElementFound>().is_some()
}

impl<'a> CardNode for headless_chrome::Element<'a> {
    fn find(&self, selector: &str) -> Result<Option<Self>, CardError> {
        match self.find_element(selector) {
            Ok(element) => Ok(Some(element)),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(CardError::Dom(e.to_string())),
        }
    }

    fn find_all(&self, selector: &str) -> Result<Vec<Self>, CardError> {
        match self.find_elements(selector) {
            Ok(elements) => Ok(elements),
            Err(e) if is_missing(&e) => Ok(Vec::new()),
            Err(e) => Err(CardError::Dom(e.to_string())),
        }
    }

    fn attr(&self, name: &str) -> Result<Option<String>, CardError> {
        self.get_attribute_value(name)
            .map_err(|e| CardError::Dom(e.to_string()))
    }

    fn inner_text(&self) -> Result<String, CardError> {
        self.get_inner_text()
            .map_err(|e| CardError::Dom(e.to_string()))
    }
}

// ============================================================================
// Saved HTML snapshot
// ============================================================================

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, CardError> {
    Selector::parse(selector).map_err(|_| CardError::Selector {
        selector: selector.to_string(),
    })
}

impl<'a> CardNode for ElementRef<'a> {
    fn find(&self, selector: &str) -> Result<Option<Self>, CardError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).next())
    }

    fn find_all(&self, selector: &str) -> Result<Vec<Self>, CardError> {
        let selector = parse_selector(selector)?;
        Ok(self.select(&selector).collect())
    }

    fn attr(&self, name: &str) -> Result<Option<String>, CardError> {
        Ok(self.value().attr(name).map(|s| s.to_string()))
    }

    fn inner_text(&self) -> Result<String, CardError> {
        Ok(self.text().collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const CARD: &str = r#"
        <div class="card">
            <ul>
                <li class="item">Orden mín: 2 piezas</li>
                <li class="item">Entrega est. 12 abr</li>
            </ul>
            <span class="empty"></span>
        </div>
    "#;

    fn with_card<F: FnOnce(ElementRef<'_>)>(f: F) {
        let doc = Html::parse_fragment(CARD);
        let sel = Selector::parse("div.card").unwrap();
        f(doc.select(&sel).next().unwrap());
    }

    #[test]
    fn absent_field_falls_back() {
        assert_eq!(Field::Absent.or_empty(), "");
        assert_eq!(Field::Absent.or_sentinel("undefined"), "undefined");
    }

    #[test]
    fn present_field_is_trimmed_and_keeps_blank() {
        assert_eq!(Field::Present("  US$ 3  \n".into()).or_empty(), "US$ 3");
        assert_eq!(Field::Present("   ".into()).or_sentinel("undefined"), "");
    }

    #[test]
    fn find_returns_none_for_missing_element() {
        with_card(|card| {
            assert!(card.find(".store-name").unwrap().is_none());
            assert!(card.find("span.empty").unwrap().is_some());
        });
    }

    #[test]
    fn find_with_text_matches_label_case_insensitively() {
        with_card(|card| {
            let hit = card.find_with_text("li.item", "entrega EST.").unwrap().unwrap();
            assert_eq!(hit.inner_text().unwrap(), "Entrega est. 12 abr");
            assert!(card.find_with_text("li.item", "Envío").unwrap().is_none());
        });
    }

    #[test]
    fn bad_selector_is_a_card_error() {
        with_card(|card| {
            let err = card.find("div[").unwrap_err();
            assert!(matches!(err, CardError::Selector { .. }), "got: {err:?}");
        });
    }
}
