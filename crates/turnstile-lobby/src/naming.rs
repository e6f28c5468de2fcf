//! Room identifier generation.
//!
//! Room names are grouping labels, not secrets: they only have to be
//! unlikely to collide among the rooms open at the same time.

use rand::Rng;
use rand::seq::IndexedRandom;
use turnstile_protocol::RoomId;

/// Produces fresh room identifiers.
pub trait RoomNamer: Send + Sync + 'static {
    fn generate(&self) -> RoomId;
}

const WORDS: &[&str] = &[
    "amber", "anchor", "apple", "arrow", "aspen", "autumn", "badger", "basil",
    "beacon", "birch", "bison", "bloom", "breeze", "brook", "canyon", "cedar",
    "cinder", "clover", "cobalt", "comet", "coral", "cricket", "crystal", "dawn",
    "delta", "dune", "eagle", "ember", "falcon", "fern", "fjord", "flint",
    "forest", "fox", "frost", "garnet", "glacier", "granite", "harbor", "hazel",
    "heron", "hollow", "indigo", "iris", "ivory", "jade", "juniper", "kestrel",
    "lagoon", "lake", "lantern", "laurel", "lemon", "lilac", "lotus", "lynx",
    "maple", "marble", "meadow", "mesa", "mint", "moss", "nectar", "nova",
    "oak", "ocean", "olive", "onyx", "opal", "orchid", "otter", "owl",
    "pebble", "pepper", "pine", "plum", "prairie", "quail", "quartz", "quiet",
    "raven", "reef", "ridge", "river", "robin", "sage", "salmon", "sparrow",
    "spruce", "squid", "stone", "summit", "thistle", "thunder", "tide", "tulip",
    "valley", "velvet", "violet", "walnut", "willow", "wren", "yarrow", "zephyr",
];

/// Joins a random number of dictionary words with a numeric salt,
/// e.g. `amber-otter-quiet-lake-4821`.
#[derive(Debug, Clone)]
pub struct WordNamer {
    min_words: usize,
    max_words: usize,
    salt_bound: u32,
}

impl WordNamer {
    /// # Panics
    /// If `min_words` is zero or greater than `max_words`, or `salt_bound`
    /// is zero.
    pub fn new(min_words: usize, max_words: usize, salt_bound: u32) -> Self {
        assert!(min_words > 0 && min_words <= max_words, "invalid word range");
        assert!(salt_bound > 0, "salt bound must be positive");
        Self {
            min_words,
            max_words,
            salt_bound,
        }
    }
}

impl Default for WordNamer {
    fn default() -> Self {
        Self::new(4, 8, 10_000)
    }
}

impl RoomNamer for WordNamer {
    fn generate(&self) -> RoomId {
        let mut rng = rand::rng();
        let count = rng.random_range(self.min_words..=self.max_words);
        let mut parts: Vec<String> = (0..count)
            .filter_map(|_| WORDS.choose(&mut rng))
            .map(|w| (*w).to_owned())
            .collect();
        parts.push(rng.random_range(0..self.salt_bound).to_string());
        RoomId(parts.join("-"))
    }
}
