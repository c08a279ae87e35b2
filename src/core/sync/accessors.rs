/*!
 * Guarded Field Accessors
 * Getter/setter generators for structs whose fields live in a guarded cell
 */

/// Getters under any lock, setters under both, for fields of a [`CompositeCell`]
///
/// [`CompositeCell`]: crate::core::sync::CompositeCell
macro_rules! composite_accessors {
    ($cell:ident { $($(#[$doc:meta])* $get:ident / $set:ident => $field:ident: $ty:ty;)+ }) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $get<G: $crate::core::sync::HoldsAny>(&self, proof: &G) -> $ty {
                self.$cell.with(proof, |fields| fields.$field)
            }

            #[inline]
            pub fn $set(&self, proof: &$crate::core::sync::BothGuard<'_>, value: $ty) {
                self.$cell.update(proof, |fields| fields.$field = value);
            }
        )+
    };
}

/// Getters and setters under the service lock, for fields of a [`ServiceCell`]
///
/// [`ServiceCell`]: crate::core::sync::ServiceCell
macro_rules! service_accessors {
    ($cell:ident { $($(#[$doc:meta])* $get:ident / $set:ident => $field:ident: $ty:ty;)+ }) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $get<G: $crate::core::sync::HoldsService>(&self, proof: &G) -> $ty {
                self.$cell.with(proof, |fields| fields.$field)
            }

            #[inline]
            pub fn $set<G: $crate::core::sync::HoldsService>(&self, proof: &G, value: $ty) {
                self.$cell.update(proof, |fields| fields.$field = value);
            }
        )+
    };
}

pub(crate) use {composite_accessors, service_accessors};
