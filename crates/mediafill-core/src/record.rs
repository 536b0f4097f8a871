//! Record declaration macro
//!
//! [`media_record!`](crate::media_record) declares a struct and generates the
//! impls the engine needs to treat it as a record: its declared shape
//! ([`Typed`](crate::Typed)) and indexed field access
//! ([`Reflect`](crate::Reflect) + [`RecordValue`](crate::RecordValue)).
//! Field order in the generated shape is declaration order.

/// Declare a record type usable as a fill source or destination
///
/// Every field type must implement [`Typed`](crate::Typed) and
/// [`Reflect`](crate::Reflect). Records used behind `Option`/`Box`, inside
/// sequences or mappings, or as top-level destinations must also be `Default`.
///
/// # Example
/// ```rust
/// use mediafill_core::{media_record, MediaId, MediaIds, RichText};
///
/// media_record! {
///     #[derive(Debug, Default, Clone)]
///     pub struct Article {
///         pub title: String,
///         pub cover: String,
///     }
/// }
///
/// media_record! {
///     #[derive(Debug, Default, Clone)]
///     pub struct ArticleView {
///         pub title: String,
///         pub cover: MediaId,
///     }
/// }
/// ```
#[macro_export]
macro_rules! media_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $field_ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $field_ty,
            )*
        }

        impl $crate::Typed for $name {
            fn shape() -> $crate::Shape {
                fn fields() -> ::std::vec::Vec<$crate::FieldDecl> {
                    ::std::vec![
                        $(
                            $crate::FieldDecl::new(
                                ::core::stringify!($field),
                                <$field_ty as $crate::Typed>::shape(),
                            )
                        ),*
                    ]
                }
                $crate::Shape::Record($crate::RecordType::of::<$name>(
                    ::core::stringify!($name),
                    fields,
                ))
            }
        }

        impl $crate::Reflect for $name {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn value(&self) -> $crate::ValueRef<'_> {
                $crate::ValueRef::Record(self)
            }

            fn value_mut(&mut self) -> $crate::ValueMut<'_> {
                $crate::ValueMut::Record(self)
            }
        }

        impl $crate::RecordValue for $name {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field(&self, index: usize) -> ::core::option::Option<&dyn $crate::Reflect> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::core::option::Option::Some(&self.$field as &dyn $crate::Reflect);
                    }
                    position += 1;
                )*
                ::core::option::Option::None
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn field_mut(
                &mut self,
                index: usize,
            ) -> ::core::option::Option<&mut dyn $crate::Reflect> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return ::core::option::Option::Some(
                            &mut self.$field as &mut dyn $crate::Reflect,
                        );
                    }
                    position += 1;
                )*
                ::core::option::Option::None
            }
        }
    };
}
