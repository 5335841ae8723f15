//! Asset overlay records: versioned wire codec, ledger journal, and helpers.

pub mod error;
pub mod hash_field;
pub mod journal;
pub mod name;
pub mod new_asset;
pub mod null_data;
pub mod reissue;
pub mod script;
pub mod toll;
pub mod transfer;
pub mod verifier;
pub mod version;
pub mod view;

pub use error::AssetError;
pub use hash_field::{ContentHash, HashFieldRead};
pub use journal::{
    BlockJournal, BlockRef, JournalEntry, NewAssetEntry, NewOwnerEntry, NewTransferEntry,
    QualifierAddressEntry, QualifierType, ReissueAssetEntry, RestrictedAddressEntry,
    RestrictedGlobalEntry, RestrictedType, RestrictedVerifiersEntry, RootQualifierCheckerEntry,
    SpendAssetEntry, UndoAssetAmountEntry,
};
pub use name::{is_unique_name, AssetType};
pub use new_asset::{DatabasedAssetData, NewAsset, SerializeTarget, TollTerms};
pub use null_data::{NullAssetData, NullAssetVerifierString};
pub use reissue::{ReissueAsset, ReissueTollTerms};
pub use script::{parse_asset_script, AssetScript, AssetScriptKind};
pub use toll::{calculate_toll, TollTracker};
pub use transfer::AssetTransfer;
pub use verifier::{VerifierError, VerifierExpr};
pub use version::ProtocolVersion;
pub use view::AssetStateView;
