use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct InputDto {
    pub text: String,
    pub sub_map: HashMap<String, String>,
    pub sub_list: Vec<String>,
    pub sub_input_dto: Option<SubInputDto>,
    #[serde(skip)]
    pub received_at: u64,
}

#[derive(Debug, Deserialize)]
pub struct SubInputDto {
    sub_text_value: String,
}

impl SubInputDto {
    pub fn new(sub_text_value: String) -> Self {
        Self { sub_text_value }
    }

    pub fn get_sub_text_value(&self) -> &str {
        &self.sub_text_value
    }
}

#[derive(Debug, Serialize)]
#[extends(BaseRepresentationModel)]
pub struct OutputDto {
    #[serde(rename = "textValue")]
    pub text_value: String,
    pub sub_map: HashMap<String, String>,
    pub sub_list: Vec<String>,
    pub sub_input_dto: Option<Box<SubOutputDto>>,
}

#[derive(Debug, Serialize)]
pub struct SubOutputDto {
    pub sub_text_value: String,
}

#[derive(Debug, Default, Serialize)]
#[extends(RepresentationModel<BaseRepresentationModel>)]
pub struct BaseRepresentationModel {
    pub links: Vec<String>,
}
