//! 远端错误归类
//!
//! 远端返回的错误码是松散的字符串，这里把它们映射到各操作族各自封闭的枚举：
//! 1. 空串 → 该族的兜底成员
//! 2. 转大写，按该族的词汇替换表改写（远端说 BLOG，本地模型说 SITE）
//! 3. 与成员名做大小写不敏感的精确匹配，匹配不到 → 兜底成员
//!
//! 各族互相独立，不做跨族匹配。

use serde::{Deserialize, Serialize};

use crate::codec::{string_enum, EnumCodec};

/// 一族错误类型
pub trait ErrorKind: EnumCodec {
    /// 归类前对大写错误码做的词汇替换 (远端词, 本地词)
    const SUBSTITUTIONS: &'static [(&'static str, &'static str)] = &[];
}

/// 把原始错误码归类到族 `K`
pub fn classify<K: ErrorKind>(raw_code: &str) -> K {
    if raw_code.is_empty() {
        return K::FALLBACK;
    }
    let mut normalized = raw_code.to_uppercase();
    for (remote, local) in K::SUBSTITUTIONS {
        normalized = normalized.replace(remote, local);
    }
    K::decode(Some(&normalized))
}

string_enum! {
    /// 站点读写错误
    pub enum SiteErrorType {
        InvalidSite => "INVALID_SITE",
        DuplicateSite => "DUPLICATE_SITE",
        GenericError => "GENERIC_ERROR",
    }
    fallback = GenericError;
}

impl ErrorKind for SiteErrorType {}

string_enum! {
    /// 新建站点错误
    pub enum NewSiteErrorType {
        SiteNameRequired => "SITE_NAME_REQUIRED",
        SiteNameNotAllowed => "SITE_NAME_NOT_ALLOWED",
        SiteNameMustBeAtLeastFourCharacters => "SITE_NAME_MUST_BE_AT_LEAST_FOUR_CHARACTERS",
        SiteNameMustBeLessThanSixtyFourCharacters => "SITE_NAME_MUST_BE_LESS_THAN_SIXTY_FOUR_CHARACTERS",
        SiteNameContainsInvalidCharacters => "SITE_NAME_CONTAINS_INVALID_CHARACTERS",
        SiteNameCantBeUsed => "SITE_NAME_CANT_BE_USED",
        SiteNameOnlyLowercaseLettersAndNumbers => "SITE_NAME_ONLY_LOWERCASE_LETTERS_AND_NUMBERS",
        SiteNameMustIncludeLetters => "SITE_NAME_MUST_INCLUDE_LETTERS",
        SiteNameExists => "SITE_NAME_EXISTS",
        SiteNameReserved => "SITE_NAME_RESERVED",
        SiteNameReservedButMayBeAvailable => "SITE_NAME_RESERVED_BUT_MAY_BE_AVAILABLE",
        SiteNameInvalid => "SITE_NAME_INVALID",
        SiteTitleInvalid => "SITE_TITLE_INVALID",
        GenericError => "GENERIC_ERROR",
    }
    fallback = GenericError;
}

impl ErrorKind for NewSiteErrorType {
    // 远端新建接口的错误码用 BLOG，本地统一叫 SITE
    const SUBSTITUTIONS: &'static [(&'static str, &'static str)] = &[("BLOG", "SITE")];
}

string_enum! {
    /// 删除站点错误
    pub enum DeleteSiteErrorType {
        InvalidSite => "INVALID_SITE",
        /// 用户没有删除权限
        Unauthorized => "UNAUTHORIZED",
        /// 缺少访问令牌
        AuthorizationRequired => "AUTHORIZATION_REQUIRED",
        GenericError => "GENERIC_ERROR",
    }
    fallback = GenericError;
}

impl ErrorKind for DeleteSiteErrorType {}

string_enum! {
    /// 导出站点错误
    pub enum ExportSiteErrorType {
        InvalidSite => "INVALID_SITE",
        GenericError => "GENERIC_ERROR",
    }
    fallback = GenericError;
}

impl ErrorKind for ExportSiteErrorType {}

string_enum! {
    /// 域名建议错误
    pub enum SuggestDomainErrorType {
        EmptyQuery => "EMPTY_QUERY",
        InvalidMinimumQuantity => "INVALID_MINIMUM_QUANTITY",
        InvalidMaximumQuantity => "INVALID_MAXIMUM_QUANTITY",
        GenericError => "GENERIC_ERROR",
    }
    fallback = GenericError;
}

impl ErrorKind for SuggestDomainErrorType {}

string_enum! {
    /// 文章格式错误
    pub enum PostFormatsErrorType {
        InvalidSite => "INVALID_SITE",
        GenericError => "GENERIC_ERROR",
    }
    fallback = GenericError;
}

impl ErrorKind for PostFormatsErrorType {}

// ========== 事件里携带的错误对象 ==========

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteError {
    pub kind: SiteErrorType,
}

impl SiteError {
    pub fn new(kind: SiteErrorType) -> Self {
        Self { kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSiteError {
    pub kind: NewSiteErrorType,
    pub message: String,
}

impl NewSiteError {
    pub fn from_api(api_error: &str, message: impl Into<String>) -> Self {
        Self {
            kind: classify(api_error),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSiteError {
    pub kind: DeleteSiteErrorType,
    pub message: String,
}

impl DeleteSiteError {
    pub fn new(kind: DeleteSiteErrorType) -> Self {
        Self {
            kind,
            message: String::new(),
        }
    }

    pub fn from_api(api_error: &str, message: impl Into<String>) -> Self {
        Self {
            kind: classify(api_error),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSiteError {
    pub kind: ExportSiteErrorType,
}

impl ExportSiteError {
    pub fn new(kind: ExportSiteErrorType) -> Self {
        Self { kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestDomainError {
    pub kind: SuggestDomainErrorType,
    pub message: String,
}

impl SuggestDomainError {
    pub fn from_api(api_error: &str, message: impl Into<String>) -> Self {
        Self {
            kind: classify(api_error),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFormatsError {
    pub kind: PostFormatsErrorType,
}

impl PostFormatsError {
    pub fn new(kind: PostFormatsErrorType) -> Self {
        Self { kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_site_errors_rewrite_blog_to_site() {
        assert_eq!(
            classify::<NewSiteErrorType>("BLOG_NAME_REQUIRED"),
            NewSiteErrorType::SiteNameRequired
        );
        assert_eq!(
            classify::<NewSiteErrorType>("blog_name_exists"),
            NewSiteErrorType::SiteNameExists
        );
        assert_eq!(
            classify::<NewSiteErrorType>("blog_title_invalid"),
            NewSiteErrorType::SiteTitleInvalid
        );
        assert_eq!(
            classify::<NewSiteErrorType>("site_name_invalid"),
            NewSiteErrorType::SiteNameInvalid
        );
        assert_eq!(
            classify::<NewSiteErrorType>("something_else"),
            NewSiteErrorType::GenericError
        );
    }

    #[test]
    fn delete_errors() {
        assert_eq!(
            classify::<DeleteSiteErrorType>("unauthorized"),
            DeleteSiteErrorType::Unauthorized
        );
        assert_eq!(
            classify::<DeleteSiteErrorType>("authorization_required"),
            DeleteSiteErrorType::AuthorizationRequired
        );
        assert_eq!(classify::<DeleteSiteErrorType>(""), DeleteSiteErrorType::GenericError);
        assert_eq!(
            classify::<DeleteSiteErrorType>("forbidden"),
            DeleteSiteErrorType::GenericError
        );
    }

    #[test]
    fn families_do_not_leak_into_each_other() {
        // EMPTY_QUERY 只属于域名建议族
        assert_eq!(
            classify::<SuggestDomainErrorType>("empty_query"),
            SuggestDomainErrorType::EmptyQuery
        );
        assert_eq!(classify::<SiteErrorType>("empty_query"), SiteErrorType::GenericError);
        // BLOG → SITE 替换只对新建站点族生效
        assert_eq!(
            classify::<ExportSiteErrorType>("INVALID_BLOG"),
            ExportSiteErrorType::GenericError
        );
        assert_eq!(
            classify::<PostFormatsErrorType>("invalid_site"),
            PostFormatsErrorType::InvalidSite
        );
    }

    #[test]
    fn empty_code_is_generic_for_every_family() {
        assert_eq!(classify::<SiteErrorType>(""), SiteErrorType::GenericError);
        assert_eq!(classify::<NewSiteErrorType>(""), NewSiteErrorType::GenericError);
        assert_eq!(classify::<ExportSiteErrorType>(""), ExportSiteErrorType::GenericError);
        assert_eq!(
            classify::<SuggestDomainErrorType>(""),
            SuggestDomainErrorType::GenericError
        );
        assert_eq!(
            classify::<PostFormatsErrorType>(""),
            PostFormatsErrorType::GenericError
        );
    }

    #[test]
    fn error_objects_keep_message() {
        let err = NewSiteError::from_api("blog_name_reserved", "reserved name");
        assert_eq!(err.kind, NewSiteErrorType::SiteNameReserved);
        assert_eq!(err.message, "reserved name");

        let err = SuggestDomainError::from_api("", "timeout");
        assert_eq!(err.kind, SuggestDomainErrorType::GenericError);
    }
}
