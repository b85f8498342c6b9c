/*!
 * Apple string catalogs (`.xcstrings`).
 *
 * A catalog is a JSON document mapping each localizable key to its
 * per-language string units. Only the parts the translator reads or writes
 * are typed; plural and device variations are carried through as raw JSON.
 *
 * - `model`: Catalog, entry and string unit types with their queries
 * - `io`: Loading, serializing and atomically writing catalog files
 */

pub mod io;
pub mod model;

pub use model::{ExistingTranslation, Localization, StringCatalog, StringEntry, StringUnit, TranslationState};
