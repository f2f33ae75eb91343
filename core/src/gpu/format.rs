#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
  RGB32Float
}
