use syn::{Attribute, DataEnum, Field, Fields, Ident, LitInt, LitStr, Type};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    Array,
    Map,
}

pub(crate) struct ContainerSpec {
    pub layout: Layout,
}

pub(crate) struct FieldSpec {
    pub ident: Ident,
    pub ty: Type,
    /// Declared `#[msgpack(key = N)]`, or `None` to fall back to
    /// declaration order (only consulted by the array layout).
    pub key: Option<u32>,
    pub name: String,
    pub skip: bool,
    pub default: bool,
    pub unused_data: bool,
}

pub(crate) fn parse_container(attrs: &[Attribute]) -> ContainerSpec {
    let mut layout = Layout::Array;
    for attr in attrs {
        if !attr.path().is_ident("msgpack") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("layout") {
                let value: LitStr = meta.value()?.parse()?;
                layout = match value.value().as_str() {
                    "map" => Layout::Map,
                    "array" => Layout::Array,
                    other => return Err(meta.error(format!("unknown msgpack layout `{other}`"))),
                };
                Ok(())
            } else {
                Err(meta.error("unknown msgpack container attribute"))
            }
        })
        .expect("invalid #[msgpack(..)] container attribute");
    }
    ContainerSpec { layout }
}

pub(crate) fn parse_field(field: &Field) -> FieldSpec {
    let ident = field.ident.clone().expect("#[derive(MsgShape)] requires named fields");
    let ty = field.ty.clone();

    let mut key = None;
    let mut name = ident.to_string();
    let mut skip = false;
    let mut default = false;
    let mut unused_data = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("msgpack") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let value: LitInt = meta.value()?.parse()?;
                key = Some(value.base10_parse()?);
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
            } else if meta.path.is_ident("skip") {
                skip = true;
            } else if meta.path.is_ident("default") {
                default = true;
            } else if meta.path.is_ident("unused_data") {
                unused_data = true;
            } else {
                return Err(meta.error("unknown msgpack field attribute"));
            }
            Ok(())
        })
        .expect("invalid #[msgpack(..)] field attribute");
    }

    FieldSpec { ident, ty, key, name, skip, default, unused_data }
}

/// Named fields of a struct, in declaration order. Panics (at macro
/// expansion time, surfacing as a compile error) on anything else --
/// `MsgShape` only describes record-shaped types.
pub(crate) fn named_fields(fields: &Fields) -> Vec<Field> {
    match fields {
        Fields::Named(fields) => fields.named.iter().cloned().collect(),
        _ => panic!("#[derive(MsgShape)] only supports structs with named fields"),
    }
}

pub(crate) struct VariantSpec {
    pub ident: Ident,
    /// Declared `#[msgpack(key = N)]` ordinal, or `None` to fall back to
    /// declaration order.
    pub key: Option<i64>,
    pub name: String,
}

pub(crate) fn parse_variant(variant: &syn::Variant) -> VariantSpec {
    if !matches!(variant.fields, Fields::Unit) {
        panic!("#[derive(MsgShape)] only supports fieldless enum variants");
    }
    let ident = variant.ident.clone();
    let mut key = None;
    let mut name = ident.to_string();

    for attr in &variant.attrs {
        if !attr.path().is_ident("msgpack") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let value: LitInt = meta.value()?.parse()?;
                key = Some(value.base10_parse()?);
            } else if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = value.value();
            } else {
                return Err(meta.error("unknown msgpack variant attribute"));
            }
            Ok(())
        })
        .expect("invalid #[msgpack(..)] variant attribute");
    }

    VariantSpec { ident, key, name }
}

/// Variants of a fieldless enum, in declaration order.
pub(crate) fn enum_variants(data: &DataEnum) -> Vec<VariantSpec> {
    data.variants.iter().map(parse_variant).collect()
}
