macro_rules! impl_str_wrapper {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $ty {
                pub fn as_str(&self) -> &str {
                    &self.0
                }
            }
        )+
    };
}
pub(crate) use impl_str_wrapper;

macro_rules! impl_from_string {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<String> for $ty {
                fn from(value: String) -> Self {
                    Self(value.into())
                }
            }
        )+
    };
}
pub(crate) use impl_from_string;

/// Full treatment for id newtypes: string access, display and conversion
/// from the strings clap hands us.
macro_rules! impl_id {
    ($($ty:ty),+ $(,)?) => {
        $(
            crate::macros::impl_str_wrapper!($ty);
            crate::macros::impl_from_string!($ty);

            impl core::fmt::Display for $ty {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    self.0.fmt(f)
                }
            }
        )+
    };
}
pub(crate) use impl_id;
