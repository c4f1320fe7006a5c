//! C3 linearization of class hierarchies.
//!
//! The method resolution order decides where a class attribute is found and,
//! through [`TypeRegistry::is_subtype`](crate::TypeRegistry::is_subtype),
//! which types a value is an instance of.

use torchfn_core::TypeHash;

/// Compute the C3 linearization of `ty`.
///
/// `base_mros` are the already-linearized orders of `bases`, in the same
/// order. Returns `None` when no order preserves every local precedence.
pub(crate) fn linearize(
    ty: TypeHash,
    bases: &[TypeHash],
    base_mros: &[&[TypeHash]],
) -> Option<Vec<TypeHash>> {
    let mut sequences: Vec<Vec<TypeHash>> = base_mros.iter().map(|mro| mro.to_vec()).collect();
    sequences.push(bases.to_vec());

    let mut result = vec![ty];
    loop {
        sequences.retain(|seq| !seq.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }

        // A good head appears in no sequence's tail.
        let head = sequences
            .iter()
            .map(|seq| seq[0])
            .find(|candidate| sequences.iter().all(|seq| !seq[1..].contains(candidate)))?;

        result.push(head);
        for seq in &mut sequences {
            if seq[0] == head {
                seq.remove(0);
            }
        }
    }
}
