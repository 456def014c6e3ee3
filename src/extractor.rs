//! Per-card field extraction.
//!
//! Every sub-field of a card is optional: a missing element becomes an empty
//! string (or `"undefined"` for delivery) and is not an error. Anything that
//! actually fails while reading a card, including its image download, drops
//! that card as a whole. A dropped card never consumes an output index.

use tracing::{info, warn};

use crate::config::CardSelectors;
use crate::dom::{CardNode, Field};
use crate::error::CardError;
use crate::images::{normalize_image_url, ImageFetcher};
use crate::store::{ProductRecord, RecordStore};

/// Written to `delivery` when the card has no delivery line at all.
pub const DELIVERY_ABSENT: &str = "undefined";

fn text_of<N: CardNode>(node: &Option<N>) -> Result<Field, CardError> {
    match node {
        Some(node) => Ok(Field::Present(node.inner_text()?)),
        None => Ok(Field::Absent),
    }
}

fn attr_of<N: CardNode>(node: &Option<N>, name: &str) -> Result<Field, CardError> {
    match node {
        Some(node) => Ok(node.attr(name)?.into()),
        None => Ok(Field::Absent),
    }
}

/// Build the record for one card, downloading its image as `index`.
pub async fn extract_card<N: CardNode>(
    card: &N,
    selectors: &CardSelectors,
    fetcher: &ImageFetcher,
    index: usize,
) -> Result<ProductRecord, CardError> {
    let img = card.find(&selectors.image)?;
    let link = card.find(&selectors.link)?;
    let price = card.find(&selectors.price)?;
    let shop = card.find(&selectors.shop)?;
    let min_order = card.find_with_text(&selectors.sale_feature, &selectors.min_order_label)?;
    let delivery = card.find_with_text(&selectors.sale_feature, &selectors.delivery_label)?;
    let rating_container = card.find(&selectors.rating_container)?;
    let rating_value = match &rating_container {
        Some(container) => container.find(&selectors.rating_value)?,
        None => None,
    };

    let image_url = normalize_image_url(&attr_of(&img, "src")?.or_empty());
    let url = attr_of(&link, "href")?.or_empty();
    let title = text_of(&link)?.or_empty();
    let price = text_of(&price)?.or_empty();
    let shop = text_of(&shop)?.or_empty();
    let min_order = text_of(&min_order)?.or_empty();
    let delivery = text_of(&delivery)?.or_sentinel(DELIVERY_ABSENT);
    let rating = text_of(&rating_value)?.or_empty();

    let image = fetcher.fetch(&image_url, index).await?;

    Ok(ProductRecord {
        index,
        title,
        url,
        price,
        image,
        shop,
        min_order,
        delivery,
        rating,
    })
}

/// Extract every card in order, appending successes to `store`.
/// Returns the number of cards that were skipped.
pub async fn extract_all<N: CardNode>(
    cards: &[N],
    selectors: &CardSelectors,
    fetcher: &ImageFetcher,
    store: &mut RecordStore,
) -> usize {
    let mut skipped = 0;
    for (position, card) in cards.iter().enumerate() {
        let index = store.next_index();
        match extract_card(card, selectors, fetcher, index).await {
            Ok(record) => {
                info!("\t[{}] {}", record.index, record.title);
                store.append(record);
            }
            Err(e) => {
                warn!("\tError on card {}: {}", position, e);
                skipped += 1;
            }
        }
    }
    skipped
}
