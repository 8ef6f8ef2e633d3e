use super::allele::{Allele, AlleleEntry, draw_selector, draw_type};
use crate::core::models::residue::ResidueType;
use rand::Rng;

/// Two-point crossover of two sequences, in place.
///
/// With `size = min(a.len(), b.len())`, draws `p1` in `[1, size]` and `p2` in
/// `[1, size - 1]`, bumps `p2` past `p1` or orders the pair, and exchanges
/// `[p1, p2)`. Sequences shorter than two items are left alone.
///
/// # Return
///
/// The exchanged range, or `None` when nothing was exchanged.
pub fn cx_two_point<T>(a: &mut [T], b: &mut [T], rng: &mut impl Rng) -> Option<(usize, usize)> {
    let size = a.len().min(b.len());
    if size < 2 {
        return None;
    }
    let mut p1 = rng.gen_range(1..=size);
    let mut p2 = rng.gen_range(1..size);
    if p2 >= p1 {
        p2 += 1;
    } else {
        std::mem::swap(&mut p1, &mut p2);
    }
    a[p1..p2].swap_with_slice(&mut b[p1..p2]);
    Some((p1, p2))
}

/// Recombines two alleles in place.
///
/// Without ligation whole `(type, selector)` entries are exchanged. With
/// ligation only selectors are exchanged and each allele keeps its types.
pub fn crossover(
    a: &mut Allele,
    b: &mut Allele,
    ligation: bool,
    rng: &mut impl Rng,
) -> Option<(usize, usize)> {
    if !ligation {
        return cx_two_point(a.entries_mut(), b.entries_mut(), rng);
    }

    let mut selectors_a = a.selectors();
    let mut selectors_b = b.selectors();
    let range = cx_two_point(&mut selectors_a, &mut selectors_b, rng);
    for (entry, selector) in a.entries_mut().iter_mut().zip(selectors_a) {
        entry.selector = selector;
    }
    for (entry, selector) in b.entries_mut().iter_mut().zip(selectors_b) {
        entry.selector = selector;
    }
    range
}

/// Builds a fresh allele for residues whose live types are `current_types`.
///
/// Each type is drawn from the mutations plus the residue's current type.
/// Selectors are `shared` for every residue when given, else drawn per residue.
pub fn rebuild(
    current_types: &[ResidueType],
    mutations: &[ResidueType],
    shared: Option<f64>,
    rng: &mut impl Rng,
) -> Allele {
    let mut allele = Allele::default();
    for &current in current_types {
        let residue_type = draw_type(mutations, current, rng);
        let selector = match shared {
            Some(value) => value,
            None => draw_selector(rng),
        };
        allele.push(AlleleEntry::new(residue_type, selector));
    }
    allele
}
