//! Table Registry - Immutable set of table descriptors, built once at startup

use crate::error::{LoadError, Result};
use crate::ingestion::descriptor::{ColumnType, TableDescriptor};
use crate::ingestion::transform;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Encoding of the federal revenue extracts
pub const CNPJ_ENCODING: &str = "latin-1";

/// Descriptors in load order, addressable by table name
#[derive(Clone, Debug, Default)]
pub struct TableRegistry {
    tables: Vec<TableDescriptor>,
    by_name: HashMap<String, usize>,
}

impl TableRegistry {
    /// Build a registry; a later descriptor with the same table name
    /// replaces the earlier one in place.
    pub fn new(descriptors: Vec<TableDescriptor>) -> Self {
        let mut registry = Self::default();
        for descriptor in descriptors {
            match registry.by_name.get(&descriptor.table_name) {
                Some(&index) => registry.tables[index] = descriptor,
                None => {
                    registry
                        .by_name
                        .insert(descriptor.table_name.clone(), registry.tables.len());
                    registry.tables.push(descriptor);
                }
            }
        }
        registry
    }

    /// The ten tables of the CNPJ open-data dump
    pub fn cnpj() -> Self {
        Self::new(cnpj_descriptors())
    }

    pub fn get(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.by_name.get(table_name).map(|&index| &self.tables[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableDescriptor> {
        self.tables.iter()
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.table_name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Keep only the named tables, in registry order
    pub fn select(&self, table_names: &[String]) -> Result<Self> {
        if let Some(unknown) = table_names.iter().find(|name| self.get(name).is_none()) {
            return Err(LoadError::Config(format!("unknown table '{}'", unknown)));
        }
        Ok(Self::new(
            self.tables
                .iter()
                .filter(|t| table_names.contains(&t.table_name))
                .cloned()
                .collect(),
        ))
    }

    /// Assign file names to tables by each descriptor's source-file
    /// expression. A file goes to the first matching table; files matching
    /// none are ignored. Each table's files are sorted by name.
    pub fn group_files<I, S>(&self, filenames: I) -> HashMap<String, Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut grouped: HashMap<String, Vec<String>> = HashMap::new();
        for filename in filenames {
            let filename = filename.as_ref();
            match self.tables.iter().find(|t| t.matches_file(filename)) {
                Some(descriptor) => grouped
                    .entry(descriptor.table_name.clone())
                    .or_default()
                    .push(filename.to_string()),
                None => debug!(file = filename, "no table for file, ignored"),
            }
        }
        for filenames in grouped.values_mut() {
            filenames.sort();
        }
        grouped
    }

    /// List the regular files of `folder` and group them with [`Self::group_files`]
    pub fn discover_files(&self, folder: &Path) -> Result<HashMap<String, Vec<String>>> {
        let mut filenames = Vec::new();
        for entry in std::fs::read_dir(folder)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                filenames.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(self.group_files(filenames))
    }
}

fn lookup_table(label: &str, table_name: &str, expression: &str) -> TableDescriptor {
    TableDescriptor::new(label, table_name, &["codigo", "descricao"], CNPJ_ENCODING)
        .with_expression(expression)
}

/// Column layouts of the federal revenue CNPJ extracts
pub fn cnpj_descriptors() -> Vec<TableDescriptor> {
    vec![
        TableDescriptor::new(
            "empresa",
            "empresa",
            &[
                "cnpj_basico",
                "razao_social",
                "natureza_juridica",
                "qualificacao_responsavel",
                "capital_social",
                "porte_empresa",
                "ente_federativo_responsavel",
            ],
            CNPJ_ENCODING,
        )
        .with_column_type("capital_social", ColumnType::Float)
        .with_transform(transform::empresa)
        .with_expression("EMPRECSV"),
        TableDescriptor::new(
            "estabelecimento",
            "estabelecimento",
            &[
                "cnpj_basico",
                "cnpj_ordem",
                "cnpj_dv",
                "identificador_matriz_filial",
                "nome_fantasia",
                "situacao_cadastral",
                "data_situacao_cadastral",
                "motivo_situacao_cadastral",
                "nome_cidade_exterior",
                "pais",
                "data_inicio_atividade",
                "cnae_fiscal_principal",
                "cnae_fiscal_secundaria",
                "tipo_logradouro",
                "logradouro",
                "numero",
                "complemento",
                "bairro",
                "cep",
                "uf",
                "municipio",
                "ddd_1",
                "telefone_1",
                "ddd_2",
                "telefone_2",
                "ddd_fax",
                "fax",
                "correio_eletronico",
                "situacao_especial",
                "data_situacao_especial",
            ],
            CNPJ_ENCODING,
        )
        .with_column_type("data_situacao_cadastral", ColumnType::Date)
        .with_column_type("data_inicio_atividade", ColumnType::Date)
        .with_column_type("data_situacao_especial", ColumnType::Date)
        .with_transform(transform::estabelecimento)
        .with_expression("ESTABELE"),
        TableDescriptor::new(
            "socios",
            "socios",
            &[
                "cnpj_basico",
                "identificador_socio",
                "nome_socio_razao_social",
                "cpf_cnpj_socio",
                "qualificacao_socio",
                "data_entrada_sociedade",
                "pais",
                "representante_legal",
                "nome_do_representante",
                "qualificacao_representante_legal",
                "faixa_etaria",
            ],
            CNPJ_ENCODING,
        )
        .with_column_type("data_entrada_sociedade", ColumnType::Date)
        .with_transform(transform::socios)
        .with_expression("SOCIOCSV"),
        TableDescriptor::new(
            "simples",
            "simples",
            &[
                "cnpj_basico",
                "opcao_pelo_simples",
                "data_opcao_simples",
                "data_exclusao_simples",
                "opcao_mei",
                "data_opcao_mei",
                "data_exclusao_mei",
            ],
            CNPJ_ENCODING,
        )
        .with_column_type("data_opcao_simples", ColumnType::Date)
        .with_column_type("data_exclusao_simples", ColumnType::Date)
        .with_column_type("data_opcao_mei", ColumnType::Date)
        .with_column_type("data_exclusao_mei", ColumnType::Date)
        .with_transform(transform::simples)
        .with_expression("SIMPLES"),
        lookup_table("cnae", "cnae", "CNAECSV"),
        lookup_table("motivo", "moti", "MOTICSV"),
        lookup_table("município", "munic", "MUNICCSV"),
        lookup_table("natureza jurídica", "natju", "NATJUCSV"),
        lookup_table("país", "pais", "PAISCSV"),
        lookup_table("qualificação de sócio", "quals", "QUALSCSV"),
    ]
}
