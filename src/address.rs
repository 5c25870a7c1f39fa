use super::*;

const PREFIXES: &[&str] = &["1", "3", "bc1"];
const MIN_LEN: usize = 26;
const MAX_LEN: usize = 42;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AddressError {
    #[snafu(display("Invalid bitcoin address `{address}`: {reason}"))]
    InvalidAddress { address: String, reason: String },

    #[snafu(display("Bitcoin address {address} already exists"))]
    DuplicateAddress { address: Address },

    #[snafu(display("Bitcoin address {address} is not monitored"))]
    UnknownAddress { address: Address },

    #[snafu(display("Cannot remove the last bitcoin address {address}"))]
    LastAddressRemoval { address: Address },

    #[snafu(display("At least one bitcoin address is required"))]
    EmptyAddressSet,
}

/// A payout address as understood by the mining server.
///
/// Only the prefix, length and charset are checked. Checksums are left to the
/// server.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    DeserializeFromStr,
    SerializeDisplay,
)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if !PREFIXES.iter().any(|prefix| s.starts_with(prefix)) {
            return InvalidAddressSnafu {
                address: s,
                reason: "must start with 1, 3 or bc1",
            }
            .fail();
        }

        if !(MIN_LEN..=MAX_LEN).contains(&s.len()) {
            return InvalidAddressSnafu {
                address: s,
                reason: format!("length must be between {MIN_LEN} and {MAX_LEN}"),
            }
            .fail();
        }

        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return InvalidAddressSnafu {
                address: s,
                reason: "must be alphanumeric",
            }
            .fail();
        }

        Ok(Self(s.to_string()))
    }
}

/// Ordered, duplicate free and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressSet(Vec<Address>);

impl AddressSet {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Result<Self, AddressError> {
        let mut set = Vec::new();

        for address in addresses {
            if set.contains(&address) {
                return DuplicateAddressSnafu { address }.fail();
            }
            set.push(address);
        }

        if set.is_empty() {
            return EmptyAddressSetSnafu.fail();
        }

        Ok(Self(set))
    }

    pub fn add(&mut self, address: Address) -> Result<(), AddressError> {
        if self.contains(&address) {
            return DuplicateAddressSnafu { address }.fail();
        }

        self.0.push(address);

        Ok(())
    }

    pub fn remove(&mut self, address: &Address) -> Result<(), AddressError> {
        let Some(position) = self.0.iter().position(|a| a == address) else {
            return UnknownAddressSnafu {
                address: address.clone(),
            }
            .fail();
        };

        if self.0.len() == 1 {
            return LastAddressRemovalSnafu {
                address: address.clone(),
            }
            .fail();
        }

        self.0.remove(position);

        Ok(())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Address> {
        self.0.clone()
    }

    pub fn first(&self) -> &Address {
        &self.0[0]
    }
}

#[cfg(test)]
pub(crate) fn address(i: u32) -> Address {
    format!("bc1qtestaddress{i:0>20}").parse().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_prefixes() {
        for input in [
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
            "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy",
            "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq",
        ] {
            let address: Address = input.parse().unwrap();
            assert_eq!(address.as_str(), input);
        }
    }

    #[test]
    fn rejects_bad_prefix() {
        assert!(matches!(
            "2J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy".parse::<Address>(),
            Err(AddressError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn rejects_bad_length() {
        assert!("1short".parse::<Address>().is_err());
        assert!(
            format!("bc1{}", "q".repeat(40))
                .parse::<Address>()
                .is_err()
        );
    }

    #[test]
    fn trims_whitespace() {
        let address: Address = " 1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa ".parse().unwrap();
        assert_eq!(address.to_string(), "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
    }

    #[test]
    fn serde_uses_string_form() {
        let address = address(1);
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{address}\""));
        assert_eq!(serde_json::from_str::<Address>(&json).unwrap(), address);
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }

    #[test]
    fn set_rejects_empty_and_duplicates() {
        assert_eq!(
            AddressSet::new(Vec::new()),
            Err(AddressError::EmptyAddressSet)
        );
        assert_eq!(
            AddressSet::new([address(1), address(1)]),
            Err(AddressError::DuplicateAddress {
                address: address(1)
            })
        );
    }

    #[test]
    fn add_rejects_duplicate_without_change() {
        let mut set = AddressSet::new([address(1)]).unwrap();
        assert!(set.add(address(1)).is_err());
        assert_eq!(set.to_vec(), vec![address(1)]);

        set.add(address(2)).unwrap();
        assert_eq!(set.to_vec(), vec![address(1), address(2)]);
    }

    #[test]
    fn removing_last_address_is_rejected() {
        let mut set = AddressSet::new([address(1)]).unwrap();
        assert_eq!(
            set.remove(&address(1)),
            Err(AddressError::LastAddressRemoval {
                address: address(1)
            })
        );
        assert_eq!(set.to_vec(), vec![address(1)]);
    }

    #[test]
    fn remove_unknown_and_known() {
        let mut set = AddressSet::new([address(1), address(2)]).unwrap();
        assert!(matches!(
            set.remove(&address(3)),
            Err(AddressError::UnknownAddress { .. })
        ));
        set.remove(&address(1)).unwrap();
        assert_eq!(set.to_vec(), vec![address(2)]);
    }
}
