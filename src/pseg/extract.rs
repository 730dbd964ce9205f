//! Figure extraction from portal HTML.
//!
//! The portal renders usage and cost inside markup with no machine-readable
//! schema, and the markup drifts. Extraction therefore goes through a small
//! ordered set of locator strategies: by element id, by label adjacency,
//! and by JSON embedded in a script tag. When the vendor redesigns a page,
//! only the failing locator (or the constants it reads) needs replacement,
//! not the pipeline.

use crate::error::ExtractError;
use crate::model::{Commodity, RawPage};
use crate::pseg::constants;
use scraper::{ElementRef, Html, Selector};

/// Figures pulled from one commodity's region, before unit normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFigures {
    pub consumption: f64,
    /// Lowercased native unit token ("kwh", "therms", ...).
    pub unit: String,
    pub cost: f64,
    pub read_date: Option<String>,
}

/// Raw text snippets located for one commodity, not yet parsed.
#[derive(Debug, Clone)]
pub struct FigureTexts {
    pub consumption: String,
    pub unit: Option<String>,
    pub cost: String,
    pub read_date: Option<String>,
}

/// One way of finding a commodity's figure region in a document.
///
/// Returns `None` when the region this locator understands is absent;
/// the extractor then tries the next strategy.
pub trait FigureLocator: Send + Sync {
    fn name(&self) -> &'static str;

    fn locate(&self, document: &Html, commodity: Commodity) -> Option<FigureTexts>;
}

/// Extracts usage/cost figures from retrieved portal pages.
pub struct Extractor {
    locators: Vec<Box<dyn FigureLocator>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// The production locator chain: ids first (cheapest and most precise),
    /// label adjacency second, script-embedded JSON last.
    pub fn new() -> Self {
        Self {
            locators: vec![
                Box::new(ByElementId),
                Box::new(ByLabelAdjacency),
                Box::new(ByScriptJson),
            ],
        }
    }

    #[cfg(test)]
    pub fn with_locators(locators: Vec<Box<dyn FigureLocator>>) -> Self {
        Self { locators }
    }

    /// Locates and parses one commodity's figures.
    ///
    /// `RegionNotFound` is the benign outcome for accounts without that
    /// service. A located region with unparsable numeric text is
    /// `MalformedValue`. Deterministic for identical input.
    pub fn extract(&self, page: &RawPage, commodity: Commodity) -> Result<RawFigures, ExtractError> {
        let document = Html::parse_document(&page.body);

        for locator in &self.locators {
            if let Some(texts) = locator.locate(&document, commodity) {
                tracing::debug!(
                    locator = locator.name(),
                    %commodity,
                    "figure region located"
                );
                return parse_figures(commodity, texts);
            }
        }

        // Credential-free snippet of the unmatched markup for diagnosis.
        tracing::debug!(
            %commodity,
            url = %page.url,
            snippet = %markup_snippet(&page.body),
            "no locator matched"
        );
        Err(ExtractError::region_not_found(commodity))
    }
}

fn parse_figures(commodity: Commodity, texts: FigureTexts) -> Result<RawFigures, ExtractError> {
    let consumption = parse_numeric(&texts.consumption)
        .ok_or_else(|| ExtractError::malformed(commodity, "consumption", texts.consumption.trim()))?;
    let cost = parse_numeric(&texts.cost)
        .ok_or_else(|| ExtractError::malformed(commodity, "cost", texts.cost.trim()))?;

    let unit = texts
        .unit
        .as_deref()
        .map(|u| u.trim().to_lowercase())
        .filter(|u| !u.is_empty())
        .or_else(|| unit_hint(&texts.consumption))
        .unwrap_or_else(|| default_unit(commodity).to_string());

    Ok(RawFigures {
        consumption,
        unit,
        cost,
        read_date: texts
            .read_date
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
    })
}

/// The unit the vendor displays for each commodity when the page doesn't
/// label it explicitly.
fn default_unit(commodity: Commodity) -> &'static str {
    match commodity {
        Commodity::Electricity => "kwh",
        Commodity::Gas => "therms",
    }
}

/// Permissive numeric parsing: currency symbols, thousands separators, and
/// surrounding label text are stripped. `None` for text with no usable
/// number ("N/A", empty, "1.2.3").
pub fn parse_numeric(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Pulls a trailing unit token out of a combined value ("512.5 kWh").
fn unit_hint(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let token: String = trimmed
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if token.is_empty() {
        None
    } else {
        Some(token.to_lowercase())
    }
}

fn markup_snippet(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(200)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    &body[..end]
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(err) => {
            tracing::error!(selector, error = %err, "invalid selector in constants table");
            None
        }
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn select_text(scope: ElementRef, selector: &str) -> Option<String> {
    let sel = parse_selector(selector)?;
    let text = element_text(scope.select(&sel).next()?);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn document_read_date(document: &Html) -> Option<String> {
    let sel = parse_selector(constants::READ_DATE_SELECTOR)?;
    let text = element_text(document.select(&sel).next()?);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Locates figures by the stable element ids/classes the portal currently
/// uses. The precise selectors live in the constants table.
pub struct ByElementId;

impl FigureLocator for ByElementId {
    fn name(&self) -> &'static str {
        "by_element_id"
    }

    fn locate(&self, document: &Html, commodity: Commodity) -> Option<FigureTexts> {
        let region_selectors = match commodity {
            Commodity::Electricity => constants::ELECTRIC_REGION_SELECTORS,
            Commodity::Gas => constants::GAS_REGION_SELECTORS,
        };

        for region_selector in region_selectors {
            let sel = match parse_selector(region_selector) {
                Some(sel) => sel,
                None => continue,
            };
            let Some(region) = document.select(&sel).next() else {
                continue;
            };

            let consumption = select_text(region, constants::USAGE_VALUE_SELECTOR);
            let cost = select_text(region, constants::COST_VALUE_SELECTOR);
            if let (Some(consumption), Some(cost)) = (consumption, cost) {
                return Some(FigureTexts {
                    consumption,
                    unit: select_text(region, constants::USAGE_UNIT_SELECTOR),
                    cost,
                    read_date: document_read_date(document),
                });
            }
        }

        None
    }
}

/// Locates figures by pairing the commodity word with a usage/cost label
/// in element text, taking the smallest enclosing element. Survives id
/// churn; never relies on element ordering.
pub struct ByLabelAdjacency;

impl ByLabelAdjacency {
    /// Smallest element whose text mentions the commodity, one of the
    /// given labels, and a digit.
    fn smallest_labeled(
        document: &Html,
        commodity_word: &str,
        labels: &[&str],
    ) -> Option<String> {
        let sel = parse_selector("div, p, td, li")?;
        document
            .select(&sel)
            .filter_map(|element| {
                let text = element_text(element);
                let lowered = text.to_lowercase();
                let labeled = lowered.contains(commodity_word)
                    && labels.iter().any(|label| lowered.contains(label))
                    && lowered.chars().any(|c| c.is_ascii_digit());
                labeled.then_some(text)
            })
            .min_by_key(String::len)
    }
}

impl FigureLocator for ByLabelAdjacency {
    fn name(&self) -> &'static str {
        "by_label_adjacency"
    }

    fn locate(&self, document: &Html, commodity: Commodity) -> Option<FigureTexts> {
        let word = constants::commodity_label(commodity);

        let consumption = Self::smallest_labeled(document, word, constants::USAGE_LABELS)?;
        let cost = Self::smallest_labeled(document, word, constants::COST_LABELS)?;

        Some(FigureTexts {
            consumption,
            unit: None,
            cost,
            read_date: document_read_date(document),
        })
    }
}

/// Locates figures inside a JSON blob embedded in a script tag, the least
/// markup-dependent source when the portal ships one.
pub struct ByScriptJson;

impl ByScriptJson {
    fn json_value_text(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Pulls the outermost object literal out of a script body like
    /// `window.__USAGE__ = {...};`.
    fn embedded_object(script: &str) -> Option<serde_json::Value> {
        let start = script.find('{')?;
        let end = script.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&script[start..=end]).ok()
    }
}

impl FigureLocator for ByScriptJson {
    fn name(&self) -> &'static str {
        "by_script_json"
    }

    fn locate(&self, document: &Html, commodity: Commodity) -> Option<FigureTexts> {
        let sel = parse_selector("script")?;
        let keys = constants::json_keys(commodity);

        for script in document.select(&sel) {
            let text = script.text().collect::<String>();
            if !text.contains(constants::JSON_SCRIPT_MARKER) {
                continue;
            }
            let Some(object) = Self::embedded_object(&text) else {
                continue;
            };

            let consumption = object.get(keys.usage).and_then(Self::json_value_text);
            let cost = object.get(keys.cost).and_then(Self::json_value_text);
            if let (Some(consumption), Some(cost)) = (consumption, cost) {
                return Some(FigureTexts {
                    consumption,
                    unit: object
                        .get(keys.unit)
                        .and_then(|v| v.as_str())
                        .map(str::to_lowercase),
                    cost,
                    read_date: object
                        .get("readDate")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                });
            }
        }

        None
    }
}
