use std::collections::HashMap;
use std::hash::Hash;

use typed_index_collections::TiVec;

use super::program::{Program, VarIndex, VarKey};

pub trait AddVars {
    type Index;

    /// Create a non-negative integer variable for every index, keyed by `key`
    fn int_vars<F: FnMut(&Self::Index) -> VarKey>(
        self,
        program: &mut Program,
        key: F,
    ) -> HashMap<Self::Index, VarIndex>;
}

impl<I> AddVars for I
where
    I: IntoIterator,
    I::Item: Hash + Eq,
{
    type Index = I::Item;

    fn int_vars<F: FnMut(&Self::Index) -> VarKey>(
        self,
        program: &mut Program,
        mut key: F,
    ) -> HashMap<Self::Index, VarIndex> {
        self.into_iter()
            .map(|i| {
                let var = program.add_int_var(key(&i));
                (i, var)
            })
            .collect()
    }
}

/// Trait that converts program variables to their solved values
pub trait ConvertVars {
    type Out;
    fn convert(&self, values: &TiVec<VarIndex, f64>) -> Self::Out;
}

impl<K: Hash + Eq + Clone, T: ConvertVars> ConvertVars for HashMap<K, T> {
    type Out = HashMap<K, T::Out>;

    fn convert(&self, values: &TiVec<VarIndex, f64>) -> Self::Out {
        self.iter()
            .map(|(k, var)| (k.clone(), var.convert(values)))
            .collect()
    }
}

impl ConvertVars for VarIndex {
    type Out = f64;

    fn convert(&self, values: &TiVec<VarIndex, f64>) -> Self::Out {
        values[*self]
    }
}
