/// Rounds `value` up to the next multiple of `alignment`, which must be a power of two.
/// An alignment of 0 leaves the value untouched.
#[inline]
pub fn align_up_64(value: u64, alignment: u64) -> u64 {
  if alignment == 0 {
    return value;
  }
  debug_assert!(alignment.is_power_of_two());
  (value + alignment - 1) & !(alignment - 1)
}
