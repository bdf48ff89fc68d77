use proc_macro2::Span;
use syn::Ident;

pub(crate) fn converter_field_ident(field_name: &Ident) -> Ident {
    Ident::new(&format!("conv_{field_name}"), Span::call_site())
}

pub(crate) fn converter_struct_ident(type_name: &Ident) -> Ident {
    Ident::new(&format!("{type_name}MsgShapeConverter"), Span::call_site())
}
