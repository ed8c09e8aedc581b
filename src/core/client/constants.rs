//! Centralized constants for default endpoints and UA.

/// Default desktop UA to avoid trivial bot blocking.
pub(crate) const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/131.0.0.0 Safari/537.36"
);

/// Per-request timeout applied unless overridden.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Per-search result lifetime in the cache.
pub(crate) const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Upper bound on concurrently running provider lookups.
pub(crate) const DEFAULT_MAX_WORKERS: usize = 5;

/// S&P Global company autocomplete (`comp-name` query).
pub(crate) const DEFAULT_SNP_SEARCH: &str = "https://www.spglobal.com/esg/csa/esg-proxy";

/// S&P Global score results page (`cid` query).
pub(crate) const DEFAULT_SNP_DETAIL: &str = "https://www.spglobal.com/esg/scores/results";

/// Sustainalytics company dropdown search (form POST).
pub(crate) const DEFAULT_SUSTAINALYTICS_SEARCH: &str =
    "https://www.sustainalytics.com/sustapi/companyratings/GetCompanyDropdown";

/// Sustainalytics rating page root; the search result's relative link is appended.
pub(crate) const DEFAULT_SUSTAINALYTICS_RATING: &str = "https://www.sustainalytics.com/esg-rating";

/// ISS company search (JSON POST).
pub(crate) const DEFAULT_ISS_SEARCH: &str =
    "https://marketingwidget.iss-corporate.com/api/searchCompany";

/// ISS company details (entity id is appended).
pub(crate) const DEFAULT_ISS_DETAIL: &str =
    "https://marketingwidget.iss-corporate.com/api/getCompanyDetails/";

/// LSEG full company suggestion list.
pub(crate) const DEFAULT_LSEG_SUGGESTIONS: &str = "https://www.lseg.com/bin/esg/esgsearchsuggestions";

/// LSEG score result (`ricCode` query).
pub(crate) const DEFAULT_LSEG_DETAIL: &str = "https://www.lseg.com/bin/esg/esgsearchresult";

/// MSCI ratings search tool; search and profile are resource ids on the same page.
pub(crate) const DEFAULT_MSCI_TOOL: &str =
    "https://www.msci.com/our-solutions/esg-investing/esg-ratings-climate-search-tool";

/// CDP public responses table.
pub(crate) const DEFAULT_CDP_RESPONSES: &str = "https://www.cdp.net/en/responses";
