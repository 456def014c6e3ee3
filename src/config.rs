use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_URL: &str = "https://www.alibaba.com/picture/search.htm?imageType=oss&escapeQp=true&imageAddress=%2Ficbuimgsearch%2FimageBase64_1745173241595_109.jpeg%40%40oss_us&sourceFrom=imageupload&uploadType=pasteImg&SearchScene=the-new-header%40%40FY23SearchBar&spm=a2700.picsearch";

/// Scrape one infinite-scroll listing page into a CSV file plus product images.
#[derive(Debug, Clone, Parser)]
#[command(name = "listing-crawler", version)]
pub struct ScrapeConfig {
    /// Listing page to scrape
    #[arg(long, env = "SCRAPE_URL", default_value = DEFAULT_URL)]
    pub url: String,

    #[arg(long, env = "SCRAPE_OUTPUT_CSV", default_value = "alibaba_scrap.csv")]
    pub output_csv: PathBuf,

    #[arg(long, env = "SCRAPE_IMAGE_DIR", default_value = "alibaba_images")]
    pub image_dir: PathBuf,

    /// Where screenshots and the post-scroll HTML dump go
    #[arg(long, env = "SCRAPE_DEBUG_DIR", default_value = ".")]
    pub debug_dir: PathBuf,

    /// Number of scroll actions, always performed in full
    #[arg(long, env = "SCRAPE_SCROLLS", default_value_t = 10)]
    pub scrolls: u32,

    #[arg(long, env = "SCRAPE_SCROLL_DELTA", default_value_t = 3000)]
    pub scroll_delta: i64,

    #[arg(long, env = "SCRAPE_SETTLE_MS", default_value_t = 2000)]
    pub settle_ms: u64,

    #[arg(long, env = "SCRAPE_NAV_TIMEOUT_SECS", default_value_t = 60)]
    pub nav_timeout_secs: u64,

    #[arg(long, env = "SCRAPE_HEADLESS", default_value_t = false)]
    pub headless: bool,

    #[arg(long, env = "SCRAPE_LOCALE_COOKIE_NAME", default_value = "x-segment")]
    pub locale_cookie_name: String,

    #[arg(long, env = "SCRAPE_LOCALE_COOKIE_VALUE", default_value = "es")]
    pub locale_cookie_value: String,

    #[arg(long, env = "SCRAPE_LOCALE_COOKIE_DOMAIN", default_value = ".alibaba.com")]
    pub locale_cookie_domain: String,

    #[arg(long, env = "SCRAPE_ACCEPT_LANGUAGE", default_value = "es-ES,es;q=0.9")]
    pub accept_language: String,

    #[arg(
        long,
        env = "SCRAPE_CARD_SELECTOR",
        default_value = "div[data-spm-anchor-id][class*='search-card']"
    )]
    pub card_selector: String,

    #[arg(long, env = "SCRAPE_MIN_ORDER_LABEL", default_value = "Orden mín:")]
    pub min_order_label: String,

    #[arg(long, env = "SCRAPE_DELIVERY_LABEL", default_value = "Entrega est.")]
    pub delivery_label: String,

    /// Extract from a saved HTML page instead of launching a browser
    #[arg(long, env = "SCRAPE_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,
}

impl ScrapeConfig {
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn selectors(&self) -> CardSelectors {
        CardSelectors {
            min_order_label: self.min_order_label.clone(),
            delivery_label: self.delivery_label.clone(),
            ..CardSelectors::default()
        }
    }
}

/// Where each sub-field lives inside a card.
#[derive(Debug, Clone)]
pub struct CardSelectors {
    pub image: String,
    pub link: String,
    pub price: String,
    pub shop: String,
    /// Line items that carry the min-order and delivery labels.
    pub sale_feature: String,
    pub min_order_label: String,
    pub delivery_label: String,
    pub rating_container: String,
    /// Looked up inside the rating container only.
    pub rating_value: String,
}

impl Default for CardSelectors {
    fn default() -> Self {
        Self {
            image: "img".to_string(),
            link: "a".to_string(),
            price: ".search-card-e-price-main".to_string(),
            shop: ".store-name".to_string(),
            sale_feature: "div.search-card-m-sale-features__item".to_string(),
            min_order_label: "Orden mín:".to_string(),
            delivery_label: "Entrega est.".to_string(),
            rating_container: ".search-card-e-review".to_string(),
            rating_value: "strong".to_string(),
        }
    }
}
