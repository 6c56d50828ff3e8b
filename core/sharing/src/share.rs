//! Byte-level share representation shared by both secret regimes.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::field::FiniteField;
use crate::shamir::Share;
use keyshard_common::{Error, Result};

/// A share as stored: its index and the encoded field elements.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ByteShare {
    pub index: u8,
    pub value: Vec<u8>,
}

impl ByteShare {
    pub fn new(index: u8, value: Vec<u8>) -> Self {
        Self { index, value }
    }

    pub(crate) fn from_field<F: FiniteField>(share: &Share<F>) -> Self {
        let mut value = Vec::with_capacity(share.values.len() * F::BYTE_WIDTH);
        for element in &share.values {
            value.extend_from_slice(&element.to_bytes());
        }
        Self {
            index: share.index,
            value,
        }
    }

    pub(crate) fn to_field<F: FiniteField>(&self) -> Result<Share<F>> {
        if self.value.len() % F::BYTE_WIDTH != 0 {
            return Err(Error::InconsistentShares(format!(
                "share {} has {} bytes, not a multiple of {}",
                self.index,
                self.value.len(),
                F::BYTE_WIDTH
            )));
        }

        let values = self
            .value
            .chunks(F::BYTE_WIDTH)
            .map(|chunk| {
                F::from_bytes(chunk).ok_or_else(|| {
                    Error::InconsistentShares(format!(
                        "share {} holds a value outside the field",
                        self.index
                    ))
                })
            })
            .collect::<Result<Vec<F>>>()?;

        Ok(Share {
            index: self.index,
            values,
        })
    }
}

impl fmt::Debug for ByteShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ByteShare {{ index: {}, value: [REDACTED; {} bytes] }}",
            self.index,
            self.value.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gf256::Gf256;
    use crate::scalar::Secp256k1Scalar;

    #[test]
    fn test_debug_redacts_value() {
        let share = ByteShare::new(3, vec![0xAA; 4]);
        let shown = format!("{:?}", share);
        assert!(shown.contains("index: 3"));
        assert!(!shown.contains("170"));
    }

    #[test]
    fn test_misaligned_width_rejected() {
        let share = ByteShare::new(0, vec![0u8; 33]);
        assert!(matches!(
            share.to_field::<Secp256k1Scalar>(),
            Err(Error::InconsistentShares(_))
        ));
    }

    #[test]
    fn test_gf256_conversion() {
        let share = ByteShare::new(1, vec![1, 2, 3]);
        let field = share.to_field::<Gf256>().unwrap();
        assert_eq!(field.values, vec![Gf256(1), Gf256(2), Gf256(3)]);
        assert_eq!(ByteShare::from_field(&field), share);
    }
}
