// vim: tw=80
//! XOR parity
//!
//! Single-parity encoding and single-erasure recovery, both for individual
//! fixed-width words and for byte columns.

use fixedbitset::FixedBitSet;
use num_traits::PrimInt;
use crate::types::*;

/// A fixed-width integer that can be a member of a parity stripe.
pub trait ParityWord: PrimInt {}

impl<T: PrimInt> ParityWord for T {}

/// Compute the even parity of a stripe of data blocks.
///
/// Fails if `blocks` is empty, since an empty stripe has nothing to protect.
pub fn xor_parity<T: ParityWord>(blocks: &[T]) -> Result<T> {
    if blocks.is_empty() {
        return Err(Error::input("Parity of an empty stripe is undefined"));
    }
    Ok(blocks.iter().fold(T::zero(), |acc, &b| acc ^ b))
}

/// Reconstruct the one block missing from `known`.
///
/// # Caller obligations
///
/// The result is only meaningful if exactly one block of the original stripe
/// is absent from `known`.  That can't be checked here: with two or more
/// blocks missing, the XOR of the survivors is simply the XOR of all the
/// missing blocks, which looks just as valid as any single block.
pub fn recover_missing_block<T: ParityWord>(known: &[T], parity: T) -> T {
    known.iter().fold(parity, |acc, &b| acc ^ b)
}

/// A stripe of data words plus its parity word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParityStripe<T: ParityWord> {
    blocks: Vec<T>,
    parity: T,
}

impl<T: ParityWord> ParityStripe<T> {
    pub fn new(blocks: Vec<T>) -> Result<Self> {
        let parity = xor_parity(&blocks)?;
        Ok(ParityStripe { blocks, parity })
    }

    pub fn blocks(&self) -> &[T] {
        &self.blocks
    }

    pub fn parity(&self) -> T {
        self.parity
    }

    /// Does the XOR of every block and the parity come out to zero?
    pub fn verify(&self) -> bool {
        recover_missing_block(&self.blocks, self.parity) == T::zero()
    }

    /// Rebuild data block `idx` from the others, as if it had been lost.
    pub fn recover(&self, idx: usize) -> Result<T> {
        if idx >= self.blocks.len() {
            return Err(Error::input(format!(
                "Block {idx} is out of range for a {}-block stripe",
                self.blocks.len())));
        }
        let others = self.blocks.iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .fold(self.parity, |acc, (_, &b)| acc ^ b);
        Ok(others)
    }
}

/// An XOR encoder/decoder for byte columns, oriented towards RAID stripes.
///
/// A stripe consists of `k` data columns followed by a single parity column,
/// all of the same length.
#[derive(Clone, Copy, Debug)]
pub struct XorCodec {
    /// Number of data columns in each stripe
    k: usize,
}

impl XorCodec {
    /// Initialize a new codec
    ///
    /// # Parameters
    ///
    /// - `data_columns`:   Number of data columns in each stripe.  Must be
    ///                     at least one.
    pub fn new(data_columns: usize) -> Result<Self> {
        if data_columns == 0 {
            return Err(Error::input("A stripe needs at least one data column"));
        }
        Ok(XorCodec{k: data_columns})
    }

    /// Total columns per stripe, including parity
    pub fn stripesize(&self) -> usize {
        self.k + 1
    }

    /// Generate the parity column from a complete set of data columns
    ///
    /// # Parameters
    /// - `data`:   Input array: `k` columns, all as long as `parity`
    /// - `parity`: Storage for the parity column.  Will be overwritten.
    pub fn encode(&self, data: &[&[u8]], parity: &mut [u8]) -> Result<()> {
        if data.len() != self.k {
            return Err(Error::input(format!("Expected {} data columns, got {}",
                self.k, data.len())));
        }
        check_lengths(data.iter().copied(), parity.len())?;
        parity.fill(0);
        for col in data {
            xor_into(parity, col);
        }
        Ok(())
    }

    /// Check whether a complete stripe has consistent parity.
    ///
    /// # Parameters
    /// - `columns`:    All `k + 1` columns, data first, parity last.
    pub fn verify(&self, columns: &[&[u8]]) -> Result<bool> {
        self.check_stripe(columns.len())?;
        let len = columns[0].len();
        check_lengths(columns.iter().copied(), len)?;
        let mut acc = vec![0u8; len];
        for col in columns {
            xor_into(&mut acc, col);
        }
        Ok(acc.iter().all(|&b| b == 0))
    }

    /// Reconstruct a missing column from the surviving ones
    ///
    /// # Parameters
    ///
    /// - `columns`:    All `k + 1` columns, data first, parity last.  The
    ///                 contents of the erased column are ignored, and
    ///                 populated upon return.
    /// - `erasures`:   Bitmap of the column indices of the missing columns.
    ///                 Exactly one bit must be set.
    pub fn decode(&self, columns: &mut [&mut [u8]], erasures: &FixedBitSet)
        -> Result<()>
    {
        self.check_stripe(columns.len())?;
        let missing = match erasures.count_ones(..) {
            1 => erasures.ones().next()
                .ok_or_else(|| Error::input("Erasure bitmap is empty"))?,
            0 => return Err(Error::input(
                    "Nothing to reconstruct in an undamaged stripe")),
            n => return Err(Error::input(format!(
                    "Single parity can't recover {n} erased columns")))
        };
        if missing >= columns.len() {
            return Err(Error::input(format!("Column {missing} doesn't exist")));
        }
        let len = columns[0].len();
        check_lengths(columns.iter().map(|c| &c[..]), len)?;
        let mut acc = vec![0u8; len];
        for (i, col) in columns.iter().enumerate() {
            if i != missing {
                xor_into(&mut acc, col);
            }
        }
        columns[missing].copy_from_slice(&acc);
        Ok(())
    }

    fn check_stripe(&self, ncolumns: usize) -> Result<()> {
        if ncolumns == self.stripesize() {
            Ok(())
        } else {
            Err(Error::input(format!("Expected {} columns, got {}",
                self.stripesize(), ncolumns)))
        }
    }
}

fn check_lengths<'a, I>(columns: I, len: usize) -> Result<()>
    where I: IntoIterator<Item=&'a [u8]>
{
    if columns.into_iter().all(|c| c.len() == len) {
        Ok(())
    } else {
        Err(Error::input("All columns in a stripe must have the same length"))
    }
}

fn xor_into(acc: &mut [u8], col: &[u8]) {
    for (a, b) in acc.iter_mut().zip(col) {
        *a ^= b;
    }
}
