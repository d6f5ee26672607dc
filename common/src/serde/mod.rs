mod deserializer;

pub use deserializer::{Deserializer, ReaderDeserializer, SliceDeserializer};
