use url::Url;

/// Preload policy, as the host's attribute surface exposes it.
/// Unrecognised attribute values are `Auto`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    None,
    Metadata,
    #[default]
    Auto,
}

/// Mirror of the host element's attributes that the engine reads.
///
/// The engine never writes these; hosts update them through the
/// `Player::set_*` methods, which also run the attribute-change side
/// effects (a changed source triggers a load, a changed poster re-applies
/// the overlay).
#[derive(Clone, Debug, Default)]
pub struct MediaAttributes {
    /// Source locator. `None` means the attribute is absent, which loads
    /// to the Empty network state; an empty string is a present-but-bad
    /// source and fails resource selection.
    pub src: Option<String>,
    /// Raw poster specification, classified by [`crate::Poster::classify`].
    pub poster: String,
    pub looping: bool,
    pub autoplay: bool,
    pub preload: Preload,
    /// Title restored on every terminal reset.
    pub window_title: String,
    /// Base for resolving a relative source locator.
    pub base_url: Option<Url>,
}

impl MediaAttributes {
    /// Resolves the source locator to an absolute URL, against the base
    /// when one is set.
    pub(crate) fn resolve_src(&self, src: &str) -> Option<Url> {
        let src = src.trim();
        match &self.base_url {
            Some(base) => base.join(src).ok(),
            None => Url::parse(src).ok(),
        }
    }
}
