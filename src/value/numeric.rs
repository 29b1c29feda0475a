//! Fixed-width numeric arrays
//!
//! These are the only values the raw-numeric backend can store. The raw
//! format has no header, so readers name the [`Dtype`] and array length
//! out of band.

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! numeric_types {
    ($($variant:ident($ty:ty) => $name:literal, $short:literal;)*) => {
        /// Element type of a [`NumericArray`]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum Dtype {
            $($variant,)*
        }

        impl Dtype {
            /// Size of one element in bytes
            pub fn itemsize(self) -> usize {
                match self {
                    $(Self::$variant => std::mem::size_of::<$ty>(),)*
                }
            }

            /// Canonical name, e.g. `int64`
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }

        impl FromStr for Dtype {
            type Err = CacheError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name | $short => Ok(Self::$variant),)*
                    _ => Err(CacheError::UnsupportedDtype(s.to_string())),
                }
            }
        }

        /// A homogeneous array of fixed-width numbers
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum NumericArray {
            $($variant(Vec<$ty>),)*
        }

        impl NumericArray {
            pub fn dtype(&self) -> Dtype {
                match self {
                    $(Self::$variant(_) => Dtype::$variant,)*
                }
            }

            pub fn len(&self) -> usize {
                match self {
                    $(Self::$variant(v) => v.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Append the native-endian element bytes to `out`
            pub fn write_ne_bytes(&self, out: &mut Vec<u8>) {
                out.reserve(self.len() * self.dtype().itemsize());
                match self {
                    $(Self::$variant(v) => {
                        for x in v {
                            out.extend_from_slice(&x.to_ne_bytes());
                        }
                    })*
                }
            }

            /// Reinterpret native-endian bytes as an array of `dtype`.
            ///
            /// Trailing bytes that do not fill a whole element are ignored;
            /// callers check alignment first.
            pub fn from_ne_bytes(dtype: Dtype, bytes: &[u8]) -> Self {
                match dtype {
                    $(Dtype::$variant => {
                        const SIZE: usize = std::mem::size_of::<$ty>();
                        let values = bytes
                            .chunks_exact(SIZE)
                            .map(|chunk| {
                                let mut buf = [0u8; SIZE];
                                buf.copy_from_slice(chunk);
                                <$ty>::from_ne_bytes(buf)
                            })
                            .collect();
                        Self::$variant(values)
                    })*
                }
            }

            /// Elements as JSON numbers (non-finite floats become null)
            pub fn to_json(&self) -> serde_json::Value {
                match self {
                    $(Self::$variant(v) => serde_json::Value::Array(
                        v.iter().map(|x| serde_json::json!(x)).collect(),
                    ),)*
                }
            }
        }

        $(
            impl From<Vec<$ty>> for NumericArray {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values)
                }
            }
        )*
    };
}

numeric_types! {
    I8(i8) => "int8", "i8";
    I16(i16) => "int16", "i16";
    I32(i32) => "int32", "i32";
    I64(i64) => "int64", "i64";
    U8(u8) => "uint8", "u8";
    U16(u16) => "uint16", "u16";
    U32(u32) => "uint32", "u32";
    U64(u64) => "uint64", "u64";
    F32(f32) => "float32", "f32";
    F64(f64) => "float64", "f64";
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_itemsize() {
        assert_eq!(Dtype::I8.itemsize(), 1);
        assert_eq!(Dtype::U16.itemsize(), 2);
        assert_eq!(Dtype::F32.itemsize(), 4);
        assert_eq!(Dtype::I64.itemsize(), 8);
    }

    #[test]
    fn dtype_parse_names() {
        assert_eq!("int64".parse::<Dtype>().unwrap(), Dtype::I64);
        assert_eq!("F32".parse::<Dtype>().unwrap(), Dtype::F32);
        assert_eq!("uint8".parse::<Dtype>().unwrap(), Dtype::U8);
        assert!(matches!(
            "complex128".parse::<Dtype>(),
            Err(CacheError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn dtype_display_honors_width() {
        assert_eq!(format!("[{:<9}]", Dtype::F32), "[float32  ]");
        assert_eq!(Dtype::U16.to_string(), "uint16");
    }

    #[test]
    fn bytes_reinterpret() {
        let arr = NumericArray::from(vec![1i32, -2, 3]);
        let mut bytes = Vec::new();
        arr.write_ne_bytes(&mut bytes);
        assert_eq!(bytes.len(), 12);
        assert_eq!(NumericArray::from_ne_bytes(Dtype::I32, &bytes), arr);
    }

    #[test]
    fn float_json_handles_nan() {
        let arr = NumericArray::from(vec![1.5f64, f64::NAN]);
        assert_eq!(arr.to_json(), serde_json::json!([1.5, null]));
    }
}
