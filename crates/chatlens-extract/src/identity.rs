//! Partner name and operator handle discovery.

use chatlens_core::{IdentityLocators, Platform, Result};
use chatlens_dom::DocumentView;
use serde::Serialize;
use tracing::{debug, info};

/// Identities learned from page chrome. Either may stay unknown for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identities {
    pub partner_name: Option<String>,
    pub own_handle: Option<String>,
}

/// Resolves each identity at most once and caches it.
#[derive(Debug, Clone)]
pub struct IdentityExtractor {
    locators: Option<&'static IdentityLocators>,
    identities: Identities,
}

impl IdentityExtractor {
    pub fn new(platform: Platform) -> Self {
        Self {
            locators: platform.identity_locators(),
            identities: Identities::default(),
        }
    }

    pub fn identities(&self) -> &Identities {
        &self.identities
    }

    /// True once both identities are known.
    pub fn is_resolved(&self) -> bool {
        self.identities.partner_name.is_some() && self.identities.own_handle.is_some()
    }

    /// Look for whichever identities are still unknown.
    pub fn extract<D: DocumentView>(&mut self, doc: &D) -> Result<()> {
        let Some(locators) = self.locators else {
            return Ok(());
        };

        if self.identities.partner_name.is_none() {
            if let Some(name) = find_partner_name(doc, locators)? {
                info!("Partner name resolved: {}", name);
                self.identities.partner_name = Some(name);
            }
        }

        if self.identities.own_handle.is_none() {
            if let Some(handle) = find_own_handle(doc, locators)? {
                info!("Operator handle resolved: {}", handle);
                self.identities.own_handle = Some(handle);
            }
        }

        Ok(())
    }
}

fn find_partner_name<D: DocumentView>(
    doc: &D,
    locators: &IdentityLocators,
) -> Result<Option<String>> {
    for selector in locators.heading_selectors {
        let Some(node) = doc.select_first(doc.root(), selector)? else {
            continue;
        };
        let text = doc.text(node);
        let name = text.trim();
        let chars = name.chars().count();
        if chars == 0 || chars >= locators.max_name_chars {
            continue;
        }
        if locators.system_words.iter().any(|w| name.contains(w)) {
            debug!("Skipping heading {:?}: navigation chrome", name);
            continue;
        }
        return Ok(Some(name.to_string()));
    }
    Ok(None)
}

fn find_own_handle<D: DocumentView>(
    doc: &D,
    locators: &IdentityLocators,
) -> Result<Option<String>> {
    for link in doc.select(doc.root(), locators.profile_link_selector)? {
        let Some(href) = doc.attr(link, "href") else {
            continue;
        };
        if !href.starts_with('/')
            || locators
                .excluded_path_words
                .iter()
                .any(|w| href.contains(w))
        {
            continue;
        }
        let handle = href.trim_start_matches('/').split('/').next().unwrap_or("");
        let chars = handle.chars().count();
        if chars > 0 && chars < locators.max_handle_chars {
            return Ok(Some(handle.to_string()));
        }
    }
    Ok(None)
}
