//! Built-in token kinds and recipes available before any oracle call.

use aether_types::{KindId, RecipeKey, TokenKind};

/// Primitive kinds. These start in the library and can always be placed.
pub const PRIMITIVES: [SeedKind; 4] = [
    SeedKind::new("fire", "Fire", "🔥", "#ef4444", "Hot, bright, and consuming."),
    SeedKind::new("water", "Water", "💧", "#3b82f6", "Fluid, clear, and life-giving."),
    SeedKind::new("earth", "Earth", "🌍", "#22c55e", "Solid, stable, and grounding."),
    SeedKind::new("air", "Air", "💨", "#a8a29e", "Invisible, gaseous, and free."),
];

/// Kinds described up front so seeded recipes resolve without the oracle.
///
/// They are cataloged but stay out of the library until a merge produces them.
pub const DERIVED: [SeedKind; 10] = [
    SeedKind::new("steam", "Steam", "🌫️", "#e5e7eb", "Water in gas form."),
    SeedKind::new("lava", "Lava", "🌋", "#f97316", "Molten rock."),
    SeedKind::new("energy", "Energy", "⚡", "#eab308", "Raw power."),
    SeedKind::new("rain", "Rain", "🌧️", "#60a5fa", "Water falling from the sky."),
    SeedKind::new("mud", "Mud", "💩", "#78350f", "Wet dirt."),
    SeedKind::new("dust", "Dust", "😶‍🌫️", "#d6d3d1", "Fine powder."),
    SeedKind::new("mountain", "Mountain", "🏔️", "#57534e", "A large landform."),
    SeedKind::new("plasma", "Plasma", "⚛️", "#a855f7", "Superheated gas."),
    SeedKind::new("ocean", "Ocean", "🌊", "#1e3a8a", "A vast body of water."),
    SeedKind::new("wind", "Wind", "🍃", "#ccfbf1", "Moving air."),
];

/// `(a, b, result)` triples.
pub const RECIPES: [(&str, &str, &str); 10] = [
    ("fire", "water", "steam"),
    ("earth", "fire", "lava"),
    ("air", "fire", "energy"),
    ("air", "water", "rain"),
    ("earth", "water", "mud"),
    ("air", "earth", "dust"),
    ("earth", "earth", "mountain"),
    ("fire", "fire", "plasma"),
    ("water", "water", "ocean"),
    ("air", "air", "wind"),
];

/// Compile-time description of a seeded kind.
#[derive(Debug, Clone, Copy)]
pub struct SeedKind {
    pub id: &'static str,
    pub name: &'static str,
    pub glyph: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

impl SeedKind {
    const fn new(
        id: &'static str,
        name: &'static str,
        glyph: &'static str,
        color: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            glyph,
            color,
            description,
        }
    }

    #[must_use]
    pub fn to_kind(self) -> TokenKind {
        TokenKind::new(
            KindId::known(self.id),
            self.name,
            self.glyph,
            self.color,
            self.description,
        )
    }
}

pub(crate) fn recipes() -> impl Iterator<Item = (RecipeKey, KindId)> {
    RECIPES.iter().map(|&(a, b, result)| {
        (
            RecipeKey::new(KindId::known(a), KindId::known(b)),
            KindId::known(result),
        )
    })
}
