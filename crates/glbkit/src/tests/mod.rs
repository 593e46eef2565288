mod document_roundtrip;
