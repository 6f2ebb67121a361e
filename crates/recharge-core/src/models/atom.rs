use super::element::Element;

/// An atom in a molecular graph.
///
/// Coordinates are intentionally absent; they belong to conformers, which are
/// stored and passed separately so a single topology can carry multiple
/// geometries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atom {
    /// The chemical element of the atom.
    pub element: Element,
    /// The formal charge in elementary charge units.
    pub formal_charge: i8,
}

impl Atom {
    /// Creates a neutral atom of the given element.
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
        }
    }

    /// Creates an atom carrying a formal charge.
    pub fn charged(element: Element, formal_charge: i8) -> Self {
        Self {
            element,
            formal_charge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_atom_is_neutral() {
        let atom = Atom::new(Element::C);
        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.formal_charge, 0);
    }

    #[test]
    fn charged_atom_keeps_its_charge() {
        let atom = Atom::charged(Element::Cl, -1);
        assert_eq!(atom.element, Element::Cl);
        assert_eq!(atom.formal_charge, -1);
    }
}
