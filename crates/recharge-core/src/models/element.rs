use std::fmt;
use std::str::FromStr;

/// The chemical elements supported by the framework.
///
/// The set matches the coverage of the built-in bond charge correction
/// parameters together with boron and iodine, which appear in the wider
/// validation molecules. Anything outside this set is rejected at parse time
/// rather than failing deep inside a charge or grid calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    B,
    C,
    N,
    O,
    F,
    P,
    S,
    Cl,
    Br,
    I,
}

static SYMBOL_MAP: phf::Map<&'static str, Element> = phf::phf_map! {
    "H" => Element::H,
    "B" => Element::B,
    "C" => Element::C,
    "N" => Element::N,
    "O" => Element::O,
    "F" => Element::F,
    "P" => Element::P,
    "S" => Element::S,
    "Cl" => Element::Cl,
    "Br" => Element::Br,
    "I" => Element::I,
};

impl Element {
    /// The element symbol as written in SMILES and XYZ files.
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::Br => "Br",
            Element::I => "I",
        }
    }

    pub fn atomic_number(&self) -> u8 {
        match self {
            Element::H => 1,
            Element::B => 5,
            Element::C => 6,
            Element::N => 7,
            Element::O => 8,
            Element::F => 9,
            Element::P => 15,
            Element::S => 16,
            Element::Cl => 17,
            Element::Br => 35,
            Element::I => 53,
        }
    }

    /// The Bondi van der Waals radius in Angstroms.
    ///
    /// These are the radii used when carving the shell that ESP grid points
    /// are retained within.
    pub fn bondi_radius(&self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::B => 1.92,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::F => 1.47,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Cl => 1.75,
            Element::Br => 1.85,
            Element::I => 1.98,
        }
    }

    /// The standard valences used to resolve implicit hydrogen counts for
    /// atoms written in the SMILES organic subset, smallest first.
    pub fn default_valences(&self) -> &'static [u8] {
        match self {
            Element::H => &[1],
            Element::B => &[3],
            Element::C => &[4],
            Element::N => &[3, 5],
            Element::O => &[2],
            Element::F => &[1],
            Element::P => &[3, 5],
            Element::S => &[2, 4, 6],
            Element::Cl => &[1],
            Element::Br => &[1],
            Element::I => &[1],
        }
    }

    /// Looks up an element by its case-sensitive symbol.
    pub fn from_symbol(symbol: &str) -> Option<Element> {
        SYMBOL_MAP.get(symbol).copied()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Element::from_symbol(s).ok_or(())
    }
}
