//! Coarse classification of free-text contributor locations.

use crate::types::Region;

const NORTH_AMERICA: &[&str] = &[
    "usa",
    "united states",
    "canada",
    "mexico",
    "california",
    "new york",
    "san francisco",
    "seattle",
    "boston",
    "toronto",
    "vancouver",
    "montreal",
];

const EUROPE: &[&str] = &[
    "europe",
    "germany",
    "france",
    "united kingdom",
    "england",
    "scotland",
    "ireland",
    "netherlands",
    "belgium",
    "spain",
    "portugal",
    "italy",
    "switzerland",
    "austria",
    "sweden",
    "norway",
    "denmark",
    "finland",
    "poland",
    "london",
    "paris",
    "berlin",
    "amsterdam",
];

const ASIA: &[&str] = &[
    "asia",
    "china",
    "japan",
    "india",
    "korea",
    "singapore",
    "taiwan",
    "vietnam",
    "indonesia",
    "beijing",
    "shanghai",
    "tokyo",
    "seoul",
    "bangalore",
];

/// Keyword lists in match priority order.
const RULES: &[(Region, &[&str])] = &[
    (Region::NorthAmerica, NORTH_AMERICA),
    (Region::Europe, EUROPE),
    (Region::Asia, ASIA),
];

/// Classify a location by case-insensitive keyword containment.
///
/// North America is checked before Europe, Europe before Asia; the first region
/// with a matching keyword wins and anything unmatched is [`Region::Other`].
pub fn classify(location: &str) -> Region {
    let location = location.to_lowercase();
    RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| location.contains(k)))
        .map(|(region, _)| *region)
        .unwrap_or(Region::Other)
}
