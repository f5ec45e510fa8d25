//! Identity derivation from type names.
//!
//! A type's canonical name (`package::module::Struct`) maps to an address by
//! hashing. Module witnesses use the address of the reserved `Witness`
//! struct of their module, so every type in a module shares one witness
//! identity.
//!
//! Module witness identities come from the Rust path of the witness type,
//! so a crate can only vouch for its own modules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Identity;

/// Domain tag for type-name address derivation.
const TYPE_DOMAIN: &[u8] = b"ownership-type-v0:";

/// Name of the reserved witness struct every module may declare.
pub const WITNESS_STRUCT: &str = "Witness";

/// A type with a fixed canonical name.
///
/// Implemented by permission markers, module witnesses and dynamic field
/// values. The name must have the form `package::module::Struct`.
pub trait TypeIdentity {
    /// Canonical `package::module::Struct` name.
    const TYPE_NAME: &'static str;
}

/// A decomposed canonical type name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeName {
    package: String,
    module: String,
    name: String,
}

impl TypeName {
    /// Parse `package::module::Struct`, optionally followed by generic
    /// arguments (`Struct<0x2::coin::Coin>`).
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let malformed = || CoreError::MalformedTypeName(s.to_string());

        let mut parts = s.splitn(3, "::");
        let package = parts.next().ok_or_else(malformed)?;
        let module = parts.next().ok_or_else(malformed)?;
        let name = parts.next().ok_or_else(malformed)?;

        if package.is_empty() || !package.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed());
        }
        if !is_identifier(module) {
            return Err(malformed());
        }

        let base = match name.find('<') {
            Some(idx) => {
                if !name.ends_with('>') {
                    return Err(malformed());
                }
                &name[..idx]
            }
            None => name,
        };
        if !is_identifier(base) {
            return Err(malformed());
        }

        Ok(Self {
            package: package.to_string(),
            module: module.to_string(),
            name: name.to_string(),
        })
    }

    /// The package segment.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// The module segment.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The struct segment, including generic arguments.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `package::module` prefix.
    pub fn module_path(&self) -> String {
        format!("{}::{}", self.package, self.module)
    }

    /// The name of the `Witness` struct in this type's module.
    pub fn witness(&self) -> TypeName {
        TypeName {
            package: self.package.clone(),
            module: self.module.clone(),
            name: WITNESS_STRUCT.to_string(),
        }
    }

    /// The address this type name maps to.
    pub fn address(&self) -> Identity {
        address_of(&self.to_string())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.package, self.module, self.name)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Map a canonical type name to an address.
///
/// Pure and total: the name is hashed as given, without validation.
pub fn address_of(canonical_type_name: &str) -> Identity {
    let mut hasher = blake3::Hasher::new();
    hasher.update(TYPE_DOMAIN);
    hasher.update(canonical_type_name.as_bytes());
    Identity(*hasher.finalize().as_bytes())
}

/// The witness identity of the module that declares `type_name`.
pub fn witness_identity(type_name: &str) -> Result<Identity, CoreError> {
    Ok(TypeName::parse(type_name)?.witness().address())
}

/// The Rust path of `T` with generic arguments stripped.
///
/// The path is fixed by the crate and module that declare `T`, so no other
/// crate can produce a type with the same path.
fn rust_path<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.find('<').map_or(full, |idx| &full[..idx])
}

/// Split `T`'s Rust path into its module path and item name.
fn split_rust_path<T: ?Sized>() -> Result<(&'static str, &'static str), CoreError> {
    let path = rust_path::<T>();
    path.rsplit_once("::")
        .ok_or_else(|| CoreError::MalformedTypeName(path.to_string()))
}

impl Identity {
    /// The address image of `T`'s canonical name.
    pub fn of_type<T: TypeIdentity + ?Sized>() -> Self {
        address_of(T::TYPE_NAME)
    }

    /// The witness identity of the Rust module that declares `T`.
    ///
    /// Derived from the module's real path, never from
    /// [`TypeIdentity::TYPE_NAME`], which any implementor can choose freely.
    pub fn witness_of<T: ?Sized>() -> Result<Self, CoreError> {
        let (module, _) = split_rust_path::<T>()?;
        Ok(address_of(&format!("{module}::{WITNESS_STRUCT}")))
    }

    /// The witness identity a value of `W` vouches for.
    ///
    /// Only a module's own `Witness` struct qualifies; any other type fails
    /// with [`CoreError::NotAWitness`].
    pub fn of_witness<W: ?Sized>() -> Result<Self, CoreError> {
        let (_, name) = split_rust_path::<W>()?;
        if name != WITNESS_STRUCT {
            return Err(CoreError::NotAWitness(rust_path::<W>().to_string()));
        }
        Self::witness_of::<W>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    mod blog {
        pub struct Witness(());

        impl Witness {
            pub fn new() -> Self {
                Witness(())
            }
        }

        pub struct Post;
        pub struct Comment;
    }

    #[allow(dead_code)]
    mod profile {
        pub struct Profile;
    }

    mod impostor {
        use super::TypeIdentity;

        /// Claims the blog module's canonical witness name.
        pub struct Witness;

        impl TypeIdentity for Witness {
            const TYPE_NAME: &'static str = "0xabc::blog::Witness";
        }
    }

    struct Post;
    impl TypeIdentity for Post {
        const TYPE_NAME: &'static str = "0xabc::blog::Post";
    }

    #[test]
    fn test_parse_simple() {
        let t = TypeName::parse("0x2::coin::Coin").unwrap();
        assert_eq!(t.package(), "0x2");
        assert_eq!(t.module(), "coin");
        assert_eq!(t.name(), "Coin");
        assert_eq!(t.module_path(), "0x2::coin");
        assert_eq!(t.to_string(), "0x2::coin::Coin");
    }

    #[test]
    fn test_parse_generic() {
        let t = TypeName::parse("0x2::coin::Coin<0x2::sui::SUI>").unwrap();
        assert_eq!(t.module(), "coin");
        assert_eq!(t.name(), "Coin<0x2::sui::SUI>");
        assert_eq!(t.witness().to_string(), "0x2::coin::Witness");
    }

    #[test]
    fn test_parse_malformed() {
        for bad in [
            "",
            "Coin",
            "0x2::Coin",
            "::coin::Coin",
            "0x2::::Coin",
            "0x2::coin::",
            "0x2::9coin::Coin",
            "0x2::coin::Coin<0x2::sui::SUI",
            "0x-2::coin::Coin",
        ] {
            assert!(
                matches!(TypeName::parse(bad), Err(CoreError::MalformedTypeName(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_address_of_deterministic() {
        assert_eq!(address_of("0x2::coin::Coin"), address_of("0x2::coin::Coin"));
        assert_ne!(address_of("0x2::coin::Coin"), address_of("0x2::coin::Balance"));
    }

    #[test]
    fn test_witness_shared_within_module() {
        let post = Identity::witness_of::<blog::Post>().unwrap();
        let comment = Identity::witness_of::<blog::Comment>().unwrap();
        let profile = Identity::witness_of::<profile::Profile>().unwrap();

        assert_eq!(post, comment);
        assert_ne!(post, profile);
        assert_eq!(post, Identity::witness_of::<blog::Witness>().unwrap());
    }

    #[test]
    fn test_witness_ignores_generic_arguments() {
        assert_eq!(
            Identity::witness_of::<Vec<blog::Post>>().unwrap(),
            Identity::witness_of::<Vec<u8>>().unwrap()
        );
    }

    #[test]
    fn test_only_witness_struct_vouches() {
        let _ = blog::Witness::new();
        assert_eq!(
            Identity::of_witness::<blog::Witness>().unwrap(),
            Identity::witness_of::<blog::Post>().unwrap()
        );
        assert!(matches!(
            Identity::of_witness::<blog::Post>(),
            Err(CoreError::NotAWitness(_))
        ));
    }

    #[test]
    fn test_canonical_name_cannot_claim_module() {
        let forged = Identity::of_witness::<impostor::Witness>().unwrap();
        assert_ne!(forged, Identity::witness_of::<blog::Post>().unwrap());
        assert_ne!(forged, witness_identity(impostor::Witness::TYPE_NAME).unwrap());
    }

    #[test]
    fn test_type_identity_differs_from_witness() {
        assert_ne!(Identity::of_type::<Post>(), witness_identity(Post::TYPE_NAME).unwrap());
    }

    #[test]
    fn test_witness_identity_malformed() {
        assert!(witness_identity("not a type").is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn module_path() -> impl Strategy<Value = String> {
            ("0x[0-9a-f]{1,6}", "[a-z_][a-z0-9_]{0,8}").prop_map(|(p, m)| format!("{p}::{m}"))
        }

        proptest! {
            #[test]
            fn witness_depends_only_on_module(
                module in module_path(),
                a in "[A-Z][A-Za-z0-9]{0,8}",
                b in "[A-Z][A-Za-z0-9]{0,8}",
            ) {
                let wa = witness_identity(&format!("{module}::{a}")).unwrap();
                let wb = witness_identity(&format!("{module}::{b}<u64>")).unwrap();
                prop_assert_eq!(wa, wb);
                prop_assert_eq!(wa, address_of(&format!("{module}::{WITNESS_STRUCT}")));
            }

            #[test]
            fn parse_display_is_stable(module in module_path(), name in "[A-Za-z][A-Za-z0-9_]{0,8}") {
                let text = format!("{module}::{name}");
                let parsed = TypeName::parse(&text).unwrap();
                prop_assert_eq!(parsed.to_string(), text);
                prop_assert_eq!(parsed.module_path(), module);
            }
        }
    }
}
