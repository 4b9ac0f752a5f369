use lazy_static::lazy_static;
use std::collections::HashMap;

/// Species are identified by atomic number.
pub type SpeciesId = i16;

/// Radius used by [`SpeciesTable::covalent`] lookups is the covalent radius in Ångströms.
#[derive(Clone, Debug)]
pub struct ElementInfo {
    pub symbol: &'static str,
    pub name: &'static str,
    pub atomic_number: SpeciesId,
    pub covalent_radius: f64,
}

lazy_static! {
    /// Element symbols (case sensitive, e.g. "Na") to atomic numbers
    pub static ref ELEMENT_SYMBOLS: HashMap<&'static str, SpeciesId> = {
        ELEMENTS.iter().map(|e| (e.symbol, e.atomic_number)).collect()
    };

    /// Atomic numbers to element data
    /// Source: https://periodictable.com/Properties/A/CovalentRadius.v.log.html
    pub static ref ELEMENT_INFO: HashMap<SpeciesId, ElementInfo> = {
        ELEMENTS.iter().map(|e| (e.atomic_number, e.clone())).collect()
    };
}

const fn element(atomic_number: SpeciesId, symbol: &'static str, name: &'static str, covalent_radius: f64) -> ElementInfo {
    ElementInfo { symbol, name, atomic_number, covalent_radius }
}

// Ordered by atomic number
const ELEMENTS: &[ElementInfo] = &[
    element(1, "H", "Hydrogen", 0.31),
    element(2, "He", "Helium", 0.28),
    element(3, "Li", "Lithium", 1.28),
    element(4, "Be", "Beryllium", 0.96),
    element(5, "B", "Boron", 0.85),
    element(6, "C", "Carbon", 0.76),
    element(7, "N", "Nitrogen", 0.71),
    element(8, "O", "Oxygen", 0.66),
    element(9, "F", "Fluorine", 0.57),
    element(10, "Ne", "Neon", 0.58),
    element(11, "Na", "Sodium", 1.66),
    element(12, "Mg", "Magnesium", 1.41),
    element(13, "Al", "Aluminium", 1.21),
    element(14, "Si", "Silicon", 1.11),
    element(15, "P", "Phosphorus", 1.07),
    element(16, "S", "Sulfur", 1.05),
    element(17, "Cl", "Chlorine", 1.02),
    element(18, "Ar", "Argon", 1.06),
    element(19, "K", "Potassium", 2.03),
    element(20, "Ca", "Calcium", 1.76),
    element(21, "Sc", "Scandium", 1.7),
    element(22, "Ti", "Titanium", 1.6),
    element(23, "V", "Vanadium", 1.53),
    element(24, "Cr", "Chromium", 1.39),
    element(25, "Mn", "Manganese", 1.39),
    element(26, "Fe", "Iron", 1.32),
    element(27, "Co", "Cobalt", 1.26),
    element(28, "Ni", "Nickel", 1.24),
    element(29, "Cu", "Copper", 1.32),
    element(30, "Zn", "Zinc", 1.22),
    element(31, "Ga", "Gallium", 1.22),
    element(32, "Ge", "Germanium", 1.2),
    element(33, "As", "Arsenic", 1.19),
    element(34, "Se", "Selenium", 1.2),
    element(35, "Br", "Bromine", 1.2),
    element(36, "Kr", "Krypton", 1.16),
    element(37, "Rb", "Rubidium", 2.2),
    element(38, "Sr", "Strontium", 1.95),
    element(39, "Y", "Yttrium", 1.9),
    element(40, "Zr", "Zirconium", 1.75),
    element(41, "Nb", "Niobium", 1.64),
    element(42, "Mo", "Molybdenum", 1.54),
    element(43, "Tc", "Technetium", 1.47),
    element(44, "Ru", "Ruthenium", 1.46),
    element(45, "Rh", "Rhodium", 1.42),
    element(46, "Pd", "Palladium", 1.39),
    element(47, "Ag", "Silver", 1.45),
    element(48, "Cd", "Cadmium", 1.44),
    element(49, "In", "Indium", 1.42),
    element(50, "Sn", "Tin", 1.39),
    element(51, "Sb", "Antimony", 1.39),
    element(52, "Te", "Tellurium", 1.38),
    element(53, "I", "Iodine", 1.39),
    element(54, "Xe", "Xenon", 1.4),
    element(55, "Cs", "Cesium", 2.44),
    element(56, "Ba", "Barium", 2.15),
    element(57, "La", "Lanthanum", 2.07),
    element(72, "Hf", "Hafnium", 1.75),
    element(73, "Ta", "Tantalum", 1.7),
    element(74, "W", "Tungsten", 1.62),
    element(75, "Re", "Rhenium", 1.51),
    element(76, "Os", "Osmium", 1.44),
    element(77, "Ir", "Iridium", 1.41),
    element(78, "Pt", "Platinum", 1.36),
    element(79, "Au", "Gold", 1.36),
    element(80, "Hg", "Mercury", 1.32),
    element(81, "Tl", "Thallium", 1.45),
    element(82, "Pb", "Lead", 1.46),
    element(83, "Bi", "Bismuth", 1.48),
];

/// Looks up the atomic number for an element symbol such as "Na".
pub fn species_from_symbol(symbol: &str) -> Option<SpeciesId> {
    ELEMENT_SYMBOLS.get(symbol.trim()).copied()
}

pub fn symbol_of(species: SpeciesId) -> Option<&'static str> {
    ELEMENT_INFO.get(&species).map(|info| info.symbol)
}

/// Unordered pair of species, stored with the smaller id first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesPair(SpeciesId, SpeciesId);

impl SpeciesPair {
    pub fn new(a: SpeciesId, b: SpeciesId) -> Self {
        if a <= b {
            SpeciesPair(a, b)
        } else {
            SpeciesPair(b, a)
        }
    }

    pub fn first(&self) -> SpeciesId {
        self.0
    }

    pub fn second(&self) -> SpeciesId {
        self.1
    }
}

/// Read-only source of per-species radii and pairwise minimum distances.
pub trait SpeciesDatabase {
    fn radius_of(&self, species: SpeciesId) -> Option<f64>;

    fn pair_min_distance(&self, a: SpeciesId, b: SpeciesId) -> Option<f64>;
}

/// In-memory species database.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    radii: HashMap<SpeciesId, f64>,
    pair_distances: HashMap<SpeciesPair, f64>,
}

impl SpeciesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table pre-populated with covalent radii for every known element.
    pub fn covalent() -> Self {
        let radii = ELEMENT_INFO
            .iter()
            .map(|(&id, info)| (id, info.covalent_radius))
            .collect();
        Self {
            radii,
            pair_distances: HashMap::new(),
        }
    }

    pub fn set_radius(&mut self, species: SpeciesId, radius: f64) {
        self.radii.insert(species, radius);
    }

    pub fn set_pair_distance(&mut self, a: SpeciesId, b: SpeciesId, distance: f64) {
        self.pair_distances.insert(SpeciesPair::new(a, b), distance);
    }
}

impl SpeciesDatabase for SpeciesTable {
    fn radius_of(&self, species: SpeciesId) -> Option<f64> {
        self.radii.get(&species).copied()
    }

    fn pair_min_distance(&self, a: SpeciesId, b: SpeciesId) -> Option<f64> {
        self.pair_distances.get(&SpeciesPair::new(a, b)).copied()
    }
}
