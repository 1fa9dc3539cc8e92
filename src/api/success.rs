use actix_web::{http::StatusCode, HttpResponse};
use std::borrow::Cow;

#[derive(serde::Serialize)]
pub struct SuccessData<T: serde::Serialize> {
    pub data: Option<T>,
    pub message: Option<Cow<'static, str>>,
}

pub struct Success<T: serde::Serialize> {
    pub status: StatusCode,
    pub body: Option<SuccessData<T>>,
    pub headers: Vec<(&'static str, String)>,
}

impl<T: serde::Serialize> Success<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            status: StatusCode::OK,
            body: Some(SuccessData { data, message: None }),
            headers: Vec::new(),
        }
    }

    pub fn message<M>(mut self, msg: M) -> Self
    where
        M: Into<Cow<'static, str>>,
    {
        if let Some(body) = &mut self.body {
            body.message = Some(msg.into());
        }
        self
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn created(data: Option<T>) -> Self {
        Self {
            status: StatusCode::CREATED,
            body: Some(SuccessData { data, message: None }),
            headers: Vec::new(),
        }
    }

    pub fn not_modified() -> Self {
        Self { status: StatusCode::NOT_MODIFIED, body: None, headers: Vec::new() }
    }
}

impl<T: serde::Serialize> actix_web::Responder for Success<T> {
    type Body = actix_web::body::BoxBody;

    fn respond_to(self, _req: &actix_web::HttpRequest) -> HttpResponse<Self::Body> {
        let mut response = HttpResponse::build(self.status);

        for header in self.headers {
            response.insert_header(header);
        }

        match self.body {
            Some(body) => response.json(body),
            None => response.finish(),
        }
    }
}
