//! Documents stored in the key-value store.
//!
//! - [`Root`], [`PackageIndex`] and [`VersionIndex`] form the three-level
//!   index (all packages → versions of one package → files of one version).
//! - [`Package`] is the package descriptor, which doubles as the aggregated
//!   metadata document once its [`Asset`] list is filled in.

mod index;
mod package;

pub use self::index::{FileRecord, PackageIndex, Root, VersionIndex};
pub use self::package::{Asset, Package};
