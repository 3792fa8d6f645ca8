//! 字符串 ⇄ 枚举编解码
//!
//! 状态值、错误类型在存储层和远端协议里都是字符串，进入 SDK 后一律转成枚举：
//! - `encode`：枚举成员对应的存储/展示字符串
//! - `decode`：大小写不敏感的精确匹配，缺失、空串或无法识别时返回兜底成员
//!
//! 解码是全函数，永远不会失败。

/// 带兜底成员的字符串枚举
pub trait EnumCodec: Sized + Copy + PartialEq + 'static {
    /// 全部成员（按声明顺序）
    const VARIANTS: &'static [Self];

    /// 兜底成员（unknown / generic）
    const FALLBACK: Self;

    /// 成员对应的字符串
    fn as_str(self) -> &'static str;

    fn encode(self) -> &'static str {
        self.as_str()
    }

    fn decode(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => Self::VARIANTS
                .iter()
                .copied()
                .find(|v| v.as_str().eq_ignore_ascii_case(s))
                .unwrap_or(Self::FALLBACK),
            _ => Self::FALLBACK,
        }
    }

    fn decode_str(raw: &str) -> Self {
        Self::decode(Some(raw))
    }
}

/// 声明一个实现 [`EnumCodec`] 的字符串枚举
///
/// 同时生成 `Display`、`Default`（兜底成员）以及按字符串走的 serde 实现，
/// 反序列化同样走 `decode`，不会因为未知值报错。
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
        fallback = $fallback:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl crate::codec::EnumCodec for $name {
            const VARIANTS: &'static [Self] = &[ $( Self::$variant ),+ ];
            const FALLBACK: Self = Self::$fallback;

            fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(crate::codec::EnumCodec::as_str(*self))
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::$fallback
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(crate::codec::EnumCodec::as_str(*self))
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let raw = <Option<String> as ::serde::Deserialize>::deserialize(deserializer)?;
                Ok(<Self as crate::codec::EnumCodec>::decode(raw.as_deref()))
            }
        }
    };
}

pub(crate) use string_enum;

#[cfg(test)]
mod tests {
    use super::*;

    string_enum! {
        enum Shade {
            Unknown => "",
            Light => "light",
            DarkGrey => "dark-grey",
        }
        fallback = Unknown;
    }

    #[test]
    fn decode_roundtrips_every_member() {
        for v in Shade::VARIANTS {
            assert_eq!(Shade::decode(Some(v.encode())), *v);
        }
    }

    #[test]
    fn decode_is_case_insensitive() {
        assert_eq!(Shade::decode_str("DARK-GREY"), Shade::DarkGrey);
        assert_eq!(Shade::decode_str("Light"), Shade::Light);
    }

    #[test]
    fn decode_falls_back_on_missing_or_unknown() {
        assert_eq!(Shade::decode(None), Shade::Unknown);
        assert_eq!(Shade::decode_str(""), Shade::Unknown);
        assert_eq!(Shade::decode_str("dark_grey"), Shade::Unknown);
        assert_eq!(Shade::decode_str("not-a-shade"), Shade::Unknown);
    }

    #[test]
    fn serde_goes_through_codec() {
        let json = serde_json::to_string(&Shade::DarkGrey).unwrap();
        assert_eq!(json, "\"dark-grey\"");
        let back: Shade = serde_json::from_str("\"LIGHT\"").unwrap();
        assert_eq!(back, Shade::Light);
        let unknown: Shade = serde_json::from_str("\"purple\"").unwrap();
        assert_eq!(unknown, Shade::Unknown);
        let null: Shade = serde_json::from_str("null").unwrap();
        assert_eq!(null, Shade::Unknown);
        assert_eq!(Shade::default(), Shade::Unknown);
    }
}
