use crate::parse::ParsedDescriptors;
use crate::types::{
    ExportDescriptor, ExternType, FuncType, GlobalType, ImportDescriptor, MemoryType, TableType,
};
use crate::values::ValueKind;
use crate::wasm_unsupported;
use crate::WASM32_MAX_PAGES;
use alloc::string::ToString;
use alloc::vec::Vec;
use wasmparser::{
    ExportSectionReader, ExternalKind, FunctionSectionReader, GlobalSectionReader,
    ImportSectionReader, MemorySectionReader, Parser, Payload, TableSectionReader,
    TagSectionReader, TypeRef, TypeSectionReader,
};

/// Extracts import and export descriptors from a module binary.
///
/// The binary is expected to have passed engine validation already, so this
/// parser only tracks the index spaces exports refer into.
#[derive(Default)]
pub(crate) struct ModuleParser {
    result: ParsedDescriptors,
    types: Vec<wasmparser::FuncType>,
    /// Type index of every function, imported ones first.
    functions: Vec<u32>,
    globals: Vec<GlobalType>,
    memories: Vec<MemoryType>,
    tables: Vec<TableType>,
}

impl ModuleParser {
    pub fn parse(mut self, data: &[u8]) -> crate::Result<ParsedDescriptors> {
        let parser = Parser::new(0);

        for payload in parser.parse_all(data) {
            self.parse_payload(payload?)?;
        }

        tracing::trace!(
            imports = self.result.imports.len(),
            exports = self.result.exports.len(),
            "parsed module descriptors"
        );
        Ok(self.result)
    }

    fn parse_payload(&mut self, payload: Payload<'_>) -> crate::Result<()> {
        match payload {
            Payload::TypeSection(types) => self.parse_type_section(types)?,
            Payload::ImportSection(imports) => self.parse_import_section(imports)?,
            Payload::FunctionSection(functions) => self.parse_function_section(functions)?,
            Payload::TableSection(tables) => self.parse_table_section(tables)?,
            Payload::MemorySection(memories) => self.parse_memory_section(memories)?,
            Payload::TagSection(tags) => self.parse_tag_section(tags)?,
            Payload::GlobalSection(globals) => self.parse_global_section(globals)?,
            Payload::ExportSection(exports) => self.parse_export_section(exports)?,
            Payload::CustomSection(sec) if sec.name() == "name" || sec.name() == "producers" => {}
            Payload::CustomSection(sec) => {
                tracing::warn!("unhandled custom section {}", sec.name());
            }
            Payload::ModuleSection { .. }
            | Payload::InstanceSection(_)
            | Payload::CoreTypeSection(_)
            | Payload::ComponentSection { .. }
            | Payload::ComponentInstanceSection(_)
            | Payload::ComponentAliasSection(_)
            | Payload::ComponentTypeSection(_)
            | Payload::ComponentCanonicalSection(_)
            | Payload::ComponentStartSection { .. }
            | Payload::ComponentImportSection(_)
            | Payload::ComponentExportSection(_) => {
                return Err(wasm_unsupported!("component module"));
            }
            // code, data, elements and the start function carry no descriptor information
            _ => {}
        }

        Ok(())
    }

    fn parse_type_section(&mut self, types: TypeSectionReader<'_>) -> crate::Result<()> {
        self.types.reserve_exact(types.count() as usize);

        for ty in types.into_iter_err_on_gc_types() {
            self.types.push(ty?);
        }

        Ok(())
    }

    fn parse_import_section(&mut self, imports: ImportSectionReader<'_>) -> crate::Result<()> {
        self.result.imports.reserve_exact(imports.count() as usize);

        for import in imports {
            let import = import?;
            let ty = match import.ty {
                TypeRef::Func(index) => {
                    self.functions.push(index);
                    ExternType::Func(self.func_type(index)?)
                }
                TypeRef::Table(ty) => {
                    let ty = convert_table_type(&ty);
                    self.tables.push(ty);
                    ExternType::Table(ty)
                }
                TypeRef::Memory(ty) => {
                    let ty = convert_memory_type(&ty)?;
                    self.memories.push(ty);
                    ExternType::Memory(ty)
                }
                TypeRef::Global(ty) => {
                    let ty = convert_global_type(&ty)?;
                    self.globals.push(ty);
                    ExternType::Global(ty)
                }
                TypeRef::Tag(_) => return Err(wasm_unsupported!("exception handling")),
            };

            self.result.imports.push(ImportDescriptor {
                module: import.module.to_string(),
                name: import.name.to_string(),
                ty,
            });
        }

        Ok(())
    }

    fn parse_function_section(&mut self, functions: FunctionSectionReader<'_>) -> crate::Result<()> {
        self.functions.reserve_exact(functions.count() as usize);

        for index in functions {
            self.functions.push(index?);
        }

        Ok(())
    }

    fn parse_table_section(&mut self, tables: TableSectionReader<'_>) -> crate::Result<()> {
        for table in tables {
            self.tables.push(convert_table_type(&table?.ty));
        }

        Ok(())
    }

    fn parse_memory_section(&mut self, memories: MemorySectionReader<'_>) -> crate::Result<()> {
        for ty in memories {
            self.memories.push(convert_memory_type(&ty?)?);
        }

        Ok(())
    }

    fn parse_tag_section(&self, _tags: TagSectionReader<'_>) -> crate::Result<()> {
        Err(wasm_unsupported!("exception handling"))
    }

    fn parse_global_section(&mut self, globals: GlobalSectionReader<'_>) -> crate::Result<()> {
        for global in globals {
            self.globals.push(convert_global_type(&global?.ty)?);
        }

        Ok(())
    }

    fn parse_export_section(&mut self, exports: ExportSectionReader<'_>) -> crate::Result<()> {
        self.result.exports.reserve_exact(exports.count() as usize);

        for export in exports {
            let export = export?;
            let ty = match export.kind {
                ExternalKind::Func => {
                    let type_index = lookup(&self.functions, export.index, "function")?;
                    ExternType::Func(self.func_type(type_index)?)
                }
                ExternalKind::Table => {
                    ExternType::Table(lookup(&self.tables, export.index, "table")?)
                }
                ExternalKind::Memory => {
                    ExternType::Memory(lookup(&self.memories, export.index, "memory")?)
                }
                ExternalKind::Global => {
                    ExternType::Global(lookup(&self.globals, export.index, "global")?)
                }
                ExternalKind::Tag => return Err(wasm_unsupported!("exception handling")),
            };

            self.result.exports.push(ExportDescriptor {
                name: export.name.to_string(),
                ty,
            });
        }

        Ok(())
    }

    fn func_type(&self, index: u32) -> crate::Result<FuncType> {
        let ty = self
            .types
            .get(index as usize)
            .ok_or_else(|| out_of_bounds("type", index))?;

        let params = ty
            .params()
            .iter()
            .map(|ty| ValueKind::from_wasmparser(*ty))
            .collect::<crate::Result<Vec<_>>>()?;
        let results = ty
            .results()
            .iter()
            .map(|ty| ValueKind::from_wasmparser(*ty))
            .collect::<crate::Result<Vec<_>>>()?;

        Ok(FuncType::new(params, results))
    }
}

fn lookup<T: Copy>(space: &[T], index: u32, what: &str) -> crate::Result<T> {
    space
        .get(index as usize)
        .copied()
        .ok_or_else(|| out_of_bounds(what, index))
}

fn out_of_bounds(what: &str, index: u32) -> crate::Error {
    crate::Error::InvalidWebAssembly {
        message: alloc::format!("{what} index {index} out of bounds"),
        offset: 0,
    }
}

fn convert_table_type(ty: &wasmparser::TableType) -> TableType {
    TableType {
        minimum: u64::from(ty.initial),
        maximum: ty.maximum.map(u64::from),
    }
}

fn convert_memory_type(ty: &wasmparser::MemoryType) -> crate::Result<MemoryType> {
    if ty.memory64 {
        return Err(wasm_unsupported!("64-bit memories"));
    }
    if ty.shared {
        return Err(wasm_unsupported!("shared memories"));
    }

    let pages = |n: u64| {
        u32::try_from(n)
            .ok()
            .filter(|n| *n <= WASM32_MAX_PAGES)
            .ok_or_else(|| wasm_unsupported!("memory limit of {n} pages"))
    };

    Ok(MemoryType {
        minimum: pages(ty.initial)?,
        maximum: ty.maximum.map(pages).transpose()?,
    })
}

fn convert_global_type(ty: &wasmparser::GlobalType) -> crate::Result<GlobalType> {
    Ok(GlobalType {
        kind: ValueKind::from_wasmparser(ty.content_type)?,
        mutability: ty.mutable.into(),
    })
}
