//! Shared constants/setters for things
//!

/// Gemini REST endpoint used unless overridden.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for structured artwork discovery.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// Model used for artwork illustrations and coloring pages.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// How many artworks a search asks for.
pub const ARTWORKS_PER_SEARCH: usize = 4;

/// Placeholder cards shown while a search is running.
pub const PLACEHOLDER_CARDS: usize = 4;

/// Every image request asks for a single square image.
pub const IMAGE_ASPECT_RATIO: &str = "1:1";

/// Suffix appended to the sanitized title of a downloaded coloring page.
pub const COLORING_PAGE_SUFFIX: &str = "_coloring_page.png";

/// Shown on the page when a search fails, whatever the cause.
pub const SEARCH_FAILED_MESSAGE: &str =
    "작품을 검색하는 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";

/// Shown on a single card when its coloring page could not be made.
pub const COLORING_FAILED_MESSAGE: &str = "도안 생성에 실패했습니다. 다시 시도해주세요.";

/// Seconds between page reloads while something is still generating.
pub const PENDING_REFRESH_SECONDS: u32 = 2;

/// Sessions (and their explorer state) are dropped after this much inactivity.
pub const SESSION_INACTIVITY_HOURS: i64 = 2;

/// Cache-Control value for generated image responses.
pub const IMAGE_CACHE_CONTROL: &str = "private, no-cache";

/// Content type of every image we hand out.
pub const PNG_CONTENT_TYPE: &str = "image/png";
