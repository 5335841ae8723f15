use crate::error::AssetError;

/// Read-only queries the validity checks need from the ledger store.
pub trait AssetStateView {
    fn asset_exists(&self, name: &str) -> Result<bool, AssetError>;

    /// Verifier string attached to a restricted asset, if any.
    fn verifier_string(&self, restricted_name: &str) -> Result<Option<String>, AssetError>;

    /// Whether `address` is tagged with `qualifier` (a `#NAME`).
    fn has_qualifier(&self, address: &str, qualifier: &str) -> Result<bool, AssetError>;

    fn is_address_frozen(&self, restricted_name: &str, address: &str) -> Result<bool, AssetError>;

    fn is_globally_frozen(&self, restricted_name: &str) -> Result<bool, AssetError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};

    use super::AssetStateView;
    use crate::error::AssetError;

    #[derive(Default)]
    pub(crate) struct FixedView {
        pub assets: HashSet<String>,
        pub verifiers: HashMap<String, String>,
        pub qualifiers: HashSet<(String, String)>,
        pub frozen: HashSet<(String, String)>,
        pub global_frozen: HashSet<String>,
    }

    impl AssetStateView for FixedView {
        fn asset_exists(&self, name: &str) -> Result<bool, AssetError> {
            Ok(self.assets.contains(name))
        }

        fn verifier_string(&self, restricted_name: &str) -> Result<Option<String>, AssetError> {
            Ok(self.verifiers.get(restricted_name).cloned())
        }

        fn has_qualifier(&self, address: &str, qualifier: &str) -> Result<bool, AssetError> {
            Ok(self
                .qualifiers
                .contains(&(address.to_string(), qualifier.to_string())))
        }

        fn is_address_frozen(&self, restricted_name: &str, address: &str) -> Result<bool, AssetError> {
            Ok(self
                .frozen
                .contains(&(restricted_name.to_string(), address.to_string())))
        }

        fn is_globally_frozen(&self, restricted_name: &str) -> Result<bool, AssetError> {
            Ok(self.global_frozen.contains(restricted_name))
        }
    }
}
