//! `#[derive(MsgShape)]`: generates a `TypeShape::Object` descriptor plus a
//! `Converter` for a struct, or a `TypeShape::Enum` descriptor plus a
//! `WireEnum` impl for a fieldless enum, wired through
//! `shapepack::registry::Shaped` so other derived or built-in types can
//! resolve it as a field type without knowing it came from this macro.
//!
//! ```ignore
//! #[derive(Clone, MsgShape)]
//! #[msgpack(layout = "map")]
//! struct Point {
//!     #[msgpack(name = "x")]
//!     x: f64,
//!     #[msgpack(name = "y")]
//!     y: f64,
//! }
//! ```

mod parse;
mod util;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Generics, Ident, Type};

use parse::{ContainerSpec, FieldSpec, Layout, VariantSpec};

#[proc_macro_derive(MsgShape, attributes(msgpack))]
pub fn derive_msg_shape(input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as DeriveInput);
    match &item.data {
        Data::Struct(data) => {
            let container = parse::parse_container(&item.attrs);
            let fields: Vec<FieldSpec> = parse::named_fields(&data.fields).iter().map(parse::parse_field).collect();

            let wire_fields: Vec<&FieldSpec> = fields.iter().filter(|f| !f.skip && !f.unused_data).collect();
            let unused_data_field = fields.iter().find(|f| f.unused_data);
            let skipped_fields: Vec<&FieldSpec> = fields.iter().filter(|f| f.skip).collect();

            match container.layout {
                Layout::Array => codegen(&item.ident, &item.generics, &wire_fields, skipped_fields, unused_data_field, true).into(),
                Layout::Map => codegen(&item.ident, &item.generics, &wire_fields, skipped_fields, unused_data_field, false).into(),
            }
        }
        Data::Enum(data) => {
            let variants = parse::enum_variants(data);
            codegen_enum(&item.ident, &item.generics, &variants).into()
        }
        Data::Union(_) => syn::Error::new_spanned(&item.ident, "#[derive(MsgShape)] does not support unions").to_compile_error().into(),
    }
}

fn codegen_enum(type_name: &Ident, generics: &Generics, variants: &[VariantSpec]) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let variant_idents: Vec<&Ident> = variants.iter().map(|v| &v.ident).collect();
    let discriminants: Vec<i64> = variants.iter().enumerate().map(|(i, v)| v.key.unwrap_or(i as i64)).collect();
    let names: Vec<&str> = variants.iter().map(|v| v.name.as_str()).collect();

    let discriminant_arms = variant_idents.iter().zip(discriminants.iter()).map(|(ident, disc)| {
        quote! { #type_name::#ident => #disc, }
    });
    let from_discriminant_arms = variant_idents.iter().zip(discriminants.iter()).map(|(ident, disc)| {
        quote! { #disc => ::std::option::Option::Some(#type_name::#ident), }
    });
    let name_arms = variant_idents.iter().zip(names.iter()).map(|(ident, name)| {
        quote! { #type_name::#ident => #name, }
    });
    let variant_table = variant_idents.iter().zip(names.iter()).zip(discriminants.iter()).map(|((_ident, name), disc)| {
        quote! { (#name, #disc) }
    });

    let type_name_str = type_name.to_string();

    quote! {
        impl #impl_generics shapepack::builtin::enum_conv::WireEnum for #type_name #ty_generics #where_clause {
            fn discriminant(&self) -> i64 {
                match self {
                    #(#discriminant_arms)*
                }
            }

            fn from_discriminant(value: i64) -> ::std::option::Option<Self> {
                match value {
                    #(#from_discriminant_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }

            fn variants() -> &'static [(&'static str, i64)] {
                &[#(#variant_table),*]
            }

            fn type_name() -> &'static str {
                #type_name_str
            }
        }

        impl #impl_generics shapepack::registry::Shaped for #type_name #ty_generics #where_clause {
            fn converter(cache: &shapepack::ConverterCache) -> std::sync::Arc<dyn shapepack::Converter<Self>> {
                cache.get_or_init(
                    shapepack::TypeShape::Enum { variant_type_id: std::any::TypeId::of::<Self>() },
                    move |_cache| {
                        std::sync::Arc::new(shapepack::builtin::enum_conv::EnumConverter::<Self>::new(std::any::TypeId::of::<Self>()))
                    },
                )
            }
        }
    }
}

fn codegen(
    type_name: &Ident,
    generics: &Generics,
    wire_fields: &[&FieldSpec],
    skipped_fields: Vec<&FieldSpec>,
    unused_data_field: Option<&FieldSpec>,
    array_layout: bool,
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let converter_struct = util::converter_struct_ident(type_name);

    let field_idents: Vec<&Ident> = wire_fields.iter().map(|f| &f.ident).collect();
    let field_types: Vec<&Type> = wire_fields.iter().map(|f| &f.ty).collect();
    let converter_idents: Vec<Ident> = wire_fields.iter().map(|f| util::converter_field_ident(&f.ident)).collect();
    let names: Vec<&str> = wire_fields.iter().map(|f| f.name.as_str()).collect();

    let unused_ident = unused_data_field.map(|f| &f.ident);
    let preserve_unused_data = unused_data_field.is_some();

    let property_shapes = wire_fields.iter().enumerate().map(|(i, f)| {
        let key = f.key.unwrap_or(i as u32);
        let name = &f.name;
        let required = !f.default;
        let ty = &f.ty;
        quote! {
            shapepack::shape::PropertyShape {
                key: #key,
                name: std::borrow::Cow::Borrowed(#name),
                type_id: std::any::TypeId::of::<#ty>(),
                required: #required,
                elidable: #array_layout,
            }
        }
    });

    let constructor_shape = if array_layout {
        quote! { shapepack::shape::ConstructorShape::Positional }
    } else {
        quote! { shapepack::shape::ConstructorShape::ByName }
    };
    let object_layout = if array_layout {
        quote! { shapepack::shape::ObjectLayout::KeyedArray }
    } else {
        quote! { shapepack::shape::ObjectLayout::PropertyMap }
    };

    let build_converters = field_types.iter().zip(converter_idents.iter()).map(|(ty, conv_ident)| {
        quote! {
            let #conv_ident = <#ty as shapepack::registry::Shaped>::converter(cache);
        }
    });

    let struct_fields = field_types.iter().zip(converter_idents.iter()).map(|(ty, conv_ident)| {
        quote! { #conv_ident: std::sync::Arc<dyn shapepack::Converter<#ty>> }
    });
    let struct_init = converter_idents.iter().map(|conv_ident| quote! { #conv_ident });

    let write_body = if array_layout {
        codegen_array_write(&field_idents, &converter_idents, unused_ident)
    } else {
        codegen_map_write(&field_idents, &converter_idents, &names, wire_fields, unused_ident)
    };

    let read_body = if array_layout {
        codegen_array_read(type_name, &field_idents, &converter_idents, wire_fields, &skipped_fields, unused_ident, preserve_unused_data)
    } else {
        codegen_map_read(type_name, &field_idents, &converter_idents, &names, wire_fields, &skipped_fields, unused_ident, preserve_unused_data)
    };

    // The reference-preservation wrapper (spec §4.I) clones the decoded
    // value into its table on every fresh read, so every derived struct
    // needs `Clone` -- added only to the `Shaped` impl's bound, not to the
    // `Converter` impl, so structs that never get wrapped don't need it
    // for the converter machinery itself.
    let mut shaped_generics = generics.clone();
    shaped_generics.make_where_clause().predicates.push(syn::parse_quote! { #type_name #ty_generics: Clone });
    let (shaped_impl_generics, _, shaped_where_clause) = shaped_generics.split_for_impl();

    quote! {
        #[allow(non_camel_case_types)]
        struct #converter_struct #impl_generics #where_clause {
            #(#struct_fields,)*
            shape: shapepack::TypeShape,
        }

        impl #impl_generics shapepack::Converter<#type_name #ty_generics> for #converter_struct #ty_generics #where_clause {
            fn write(
                &self,
                ctx: &mut shapepack::SerializeContext,
                buffer: &mut shapepack::io::buffer::SegmentBuffer,
                value: &#type_name #ty_generics,
            ) -> shapepack::Result<()> {
                #write_body
            }

            fn read(
                &self,
                ctx: &mut shapepack::SerializeContext,
                buffer: &mut shapepack::io::buffer::SegmentBuffer,
            ) -> shapepack::Result<#type_name #ty_generics> {
                #read_body
            }

            fn shape(&self) -> &shapepack::TypeShape {
                &self.shape
            }
        }

        impl #shaped_impl_generics shapepack::registry::Shaped for #type_name #ty_generics #shaped_where_clause {
            fn converter(cache: &shapepack::ConverterCache) -> std::sync::Arc<dyn shapepack::Converter<Self>> {
                let shape = shapepack::TypeShape::Object {
                    properties: vec![#(#property_shapes),*],
                    constructor: #constructor_shape,
                    layout: #object_layout,
                    preserve_unused_data: #preserve_unused_data,
                };
                cache.get_or_init(shape.clone(), move |cache| {
                    #(#build_converters)*
                    let base: std::sync::Arc<dyn shapepack::Converter<Self>> = std::sync::Arc::new(#converter_struct {
                        #(#struct_init,)*
                        shape,
                    });
                    std::sync::Arc::new(shapepack::reference::ReferencingConverter::new(base))
                })
            }
        }
    }
}

fn codegen_array_write(field_idents: &[&Ident], converter_idents: &[Ident], unused_ident: Option<&Ident>) -> TokenStream2 {
    let total = field_idents.len();
    let is_default_entries = field_idents.iter().map(|ident| {
        quote! {
            ctx.options().serialize_default_values() != shapepack::options::SerializeDefaultValues::Always
                && value.#ident == ::std::default::Default::default()
        }
    });

    let write_arms = field_idents.iter().zip(converter_idents.iter()).enumerate().map(|(i, (ident, conv))| {
        quote! {
            if #i < emit_count {
                self.#conv.write(ctx, buffer, &value.#ident)?;
            }
        }
    });

    let unused_write = unused_ident.map(|ident| quote! { value.#ident.write_all(buffer); });

    quote! {
        ctx.enter(|ctx| {
            let is_default: [bool; #total] = [#(#is_default_entries),*];
            let emit_count = shapepack::object::array_layout::write_header(buffer, #total, &is_default);
            #(#write_arms)*
            #unused_write
            Ok(())
        })
    }
}

fn codegen_array_read(
    type_name: &Ident,
    field_idents: &[&Ident],
    converter_idents: &[Ident],
    wire_fields: &[&FieldSpec],
    skipped_fields: &[&FieldSpec],
    unused_ident: Option<&Ident>,
    preserve_unused_data: bool,
) -> TokenStream2 {
    let arg_idents: Vec<Ident> = field_idents.iter().map(|ident| Ident::new(&format!("arg_{ident}"), proc_macro2::Span::call_site())).collect();

    let arg_decls = arg_idents.iter().map(|arg| quote! { let mut #arg = shapepack::object::arg_state::ArgState::new(); });

    let positional_match_arms = field_idents.iter().zip(converter_idents.iter()).zip(arg_idents.iter()).enumerate().map(
        |(i, ((ident, conv), arg))| {
            let name = ident.to_string();
            quote! { #i => #arg.set(#name, self.#conv.read(ctx, buffer)?)?, }
        },
    );
    let positional_match_arms: Vec<_> = positional_match_arms.collect();
    let keyed_match_arms = positional_match_arms.clone();

    let capture_unused = if preserve_unused_data {
        quote! {
            let raw = shapepack::object::unused_data::capture_raw_value(buffer)?;
            unused.push_positional(raw);
        }
    } else {
        quote! {
            let _ = shapepack::object::unused_data::capture_raw_value(buffer)?;
        }
    };

    let unused_decl = if preserve_unused_data {
        quote! { let mut unused = shapepack::object::unused_data::UnusedDataPacket::new(); }
    } else {
        quote! {}
    };

    let field_inits = field_idents.iter().zip(wire_fields.iter()).zip(arg_idents.iter()).map(|((ident, spec), arg)| {
        let name = ident.to_string();
        if spec.default {
            quote! { #ident: #arg.or_default(), }
        } else {
            quote! { #ident: #arg.require_or_default(#name, ctx.options().deserialize_default_values())?, }
        }
    });

    let skipped_inits = skipped_fields.iter().map(|spec| {
        let ident = &spec.ident;
        quote! { #ident: ::std::default::Default::default(), }
    });

    let unused_init = unused_ident.map(|ident| quote! { #ident: unused, });

    quote! {
        ctx.enter(|ctx| {
            #(#arg_decls)*
            #unused_decl
            match shapepack::object::array_layout::read_header(buffer)? {
                shapepack::object::array_layout::HeaderForm::Array(len) => {
                    for i in 0..(len as usize) {
                        match i {
                            #(#positional_match_arms)*
                            _ => { #capture_unused }
                        }
                    }
                }
                shapepack::object::array_layout::HeaderForm::Map(len) => {
                    for _ in 0..len {
                        let key = shapepack::object::array_layout::read_map_key(buffer)? as usize;
                        match key {
                            #(#keyed_match_arms)*
                            _ => { #capture_unused }
                        }
                    }
                }
            }
            Ok(#type_name {
                #(#field_inits)*
                #(#skipped_inits)*
                #unused_init
            })
        })
    }
}

fn codegen_map_write(
    field_idents: &[&Ident],
    converter_idents: &[Ident],
    names: &[&str],
    wire_fields: &[&FieldSpec],
    unused_ident: Option<&Ident>,
) -> TokenStream2 {
    let present_flags = field_idents.iter().zip(wire_fields.iter()).map(|(ident, spec)| {
        if spec.default {
            quote! { value.#ident != ::std::default::Default::default() }
        } else {
            quote! { true }
        }
    });

    let unused_len = unused_ident
        .map(|ident| quote! { value.#ident.entries().len() })
        .unwrap_or_else(|| quote! { 0 });

    let write_entries = field_idents.iter().zip(converter_idents.iter()).zip(names.iter()).zip(present_flags.clone()).map(
        |(((ident, conv), name), present)| {
            quote! {
                if #present {
                    shapepack::object::map_layout::write_property_name(buffer, #name);
                    self.#conv.write(ctx, buffer, &value.#ident)?;
                }
            }
        },
    );

    let present_count_terms = present_flags.map(|present| quote! { (if #present { 1usize } else { 0usize }) });

    let unused_write = unused_ident.map(|ident| quote! { value.#ident.write_all(buffer); });

    quote! {
        ctx.enter(|ctx| {
            let present_count = #(#present_count_terms +)* 0usize + #unused_len;
            shapepack::object::map_layout::write_header(buffer, present_count);
            #(#write_entries)*
            #unused_write
            Ok(())
        })
    }
}

fn codegen_map_read(
    type_name: &Ident,
    field_idents: &[&Ident],
    converter_idents: &[Ident],
    names: &[&str],
    wire_fields: &[&FieldSpec],
    skipped_fields: &[&FieldSpec],
    unused_ident: Option<&Ident>,
    preserve_unused_data: bool,
) -> TokenStream2 {
    let arg_idents: Vec<Ident> = field_idents.iter().map(|ident| Ident::new(&format!("arg_{ident}"), proc_macro2::Span::call_site())).collect();
    let arg_decls = arg_idents.iter().map(|arg| quote! { let mut #arg = shapepack::object::arg_state::ArgState::new(); });

    let match_arms = names.iter().zip(converter_idents.iter()).zip(arg_idents.iter()).map(|((name, conv), arg)| {
        quote! { #name => #arg.set(#name, self.#conv.read(ctx, buffer)?)?, }
    });

    let capture_unused = if preserve_unused_data {
        quote! {
            let raw = shapepack::object::unused_data::capture_raw_value(buffer)?;
            unused.push_named(name, raw);
        }
    } else {
        quote! {
            let _ = shapepack::object::unused_data::capture_raw_value(buffer)?;
        }
    };

    let unused_decl = if preserve_unused_data {
        quote! { let mut unused = shapepack::object::unused_data::UnusedDataPacket::new(); }
    } else {
        quote! {}
    };

    let field_inits = field_idents.iter().zip(wire_fields.iter()).zip(arg_idents.iter()).map(|((ident, spec), arg)| {
        let name = ident.to_string();
        if spec.default {
            quote! { #ident: #arg.or_default(), }
        } else {
            quote! { #ident: #arg.require_or_default(#name, ctx.options().deserialize_default_values())?, }
        }
    });

    let skipped_inits = skipped_fields.iter().map(|spec| {
        let ident = &spec.ident;
        quote! { #ident: ::std::default::Default::default(), }
    });

    let unused_init = unused_ident.map(|ident| quote! { #ident: unused, });

    quote! {
        ctx.enter(|ctx| {
            let len = shapepack::object::map_layout::read_header(buffer)?;
            let mut seen = shapepack::object::map_layout::SeenProperties::new();
            #(#arg_decls)*
            #unused_decl
            for _ in 0..len {
                let name = shapepack::object::map_layout::read_property_name(buffer)?;
                seen.mark(&name)?;
                match name.as_str() {
                    #(#match_arms)*
                    _ => { #capture_unused }
                }
            }
            Ok(#type_name {
                #(#field_inits)*
                #(#skipped_inits)*
                #unused_init
            })
        })
    }
}
