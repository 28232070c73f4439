//! Listing filters and sort orders.

/// Sort order for country listings.
///
/// Rows without an estimate always sort last, in both GDP directions. Ties
/// fall back to name order so listings are stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Alphabetical by name.
    #[default]
    NameAsc,
    /// Highest estimated GDP first.
    GdpDesc,
    /// Lowest estimated GDP first.
    GdpAsc,
}

impl SortOrder {
    /// Parse a query-string value; unknown or missing values sort by name.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("gdp_desc") => SortOrder::GdpDesc,
            Some("gdp_asc") => SortOrder::GdpAsc,
            _ => SortOrder::NameAsc,
        }
    }

    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            SortOrder::NameAsc => "name ASC",
            SortOrder::GdpDesc => "estimated_gdp IS NULL, estimated_gdp DESC, name ASC",
            SortOrder::GdpAsc => "estimated_gdp IS NULL, estimated_gdp ASC, name ASC",
        }
    }
}

/// Filter for country listings. Blank values do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryFilter {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: SortOrder,
}

impl CountryFilter {
    /// Create an unfiltered, name-ordered listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to a region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = non_blank(region.into());
        self
    }

    /// Restrict to a currency code.
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = non_blank(currency.into());
        self
    }

    /// Set the sort order.
    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
